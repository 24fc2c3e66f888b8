//! Report file placement.
//!
//! Reports go under `<root>/<Operativo|Ensayo>/<name>.html`. If that
//! directory cannot be created or written, the report is written to the
//! flat legacy location `<root>/<name>.html` instead.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::FlightType;

/// Extension used for report files.
pub const REPORT_EXTENSION: &str = "html";

/// File name of the flight book.
pub const FLIGHT_BOOK_NAME: &str = "Libro_Vuelos";

/// Default report name for a flight.
#[must_use]
pub fn flight_report_name(flight_id: i64) -> String {
    format!("Flight_{flight_id}")
}

/// Report name for an aborted flight.
#[must_use]
pub fn aborted_report_name(flight_id: i64) -> String {
    format!("Flight_{flight_id}_ABORTADO")
}

/// Where report files are written.
#[derive(Debug, Clone)]
pub struct ReportPlacement {
    root: PathBuf,
}

impl ReportPlacement {
    /// Place reports under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the report tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Preferred location of a report.
    #[must_use]
    pub fn primary_path(&self, flight_type: Option<FlightType>, name: &str) -> PathBuf {
        let dir = match flight_type {
            Some(t) => self.root.join(t.as_str()),
            None => self.root.clone(),
        };
        dir.join(format!("{name}.{REPORT_EXTENSION}"))
    }

    /// Flat location used when the per-type directory is unusable.
    #[must_use]
    pub fn legacy_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{REPORT_EXTENSION}"))
    }

    /// Write `contents` to the primary location, falling back to the legacy one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReportPlacement`] if neither location can be written.
    pub async fn write(
        &self,
        flight_type: Option<FlightType>,
        name: &str,
        contents: &str,
    ) -> Result<PathBuf> {
        let primary = self.primary_path(flight_type, name);
        match write_file(&primary, contents).await {
            Ok(()) => {
                debug!("Report written to {}", primary.display());
                return Ok(primary);
            }
            Err(e) => {
                warn!(
                    "Could not write report to {}: {}; using legacy location",
                    primary.display(),
                    e
                );
            }
        }

        let legacy = self.legacy_path(name);
        write_file(&legacy, contents)
            .await
            .map_err(|source| Error::ReportPlacement {
                path: legacy.clone(),
                source,
            })?;
        debug!("Report written to {}", legacy.display());
        Ok(legacy)
    }
}

async fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_names() {
        assert_eq!(flight_report_name(7), "Flight_7");
        assert_eq!(aborted_report_name(7), "Flight_7_ABORTADO");
    }

    #[test]
    fn test_primary_path_uses_type_directory() {
        let placement = ReportPlacement::new("/reports");
        assert_eq!(
            placement.primary_path(Some(FlightType::Test), "Flight_1"),
            PathBuf::from("/reports/Ensayo/Flight_1.html")
        );
        assert_eq!(
            placement.primary_path(None, FLIGHT_BOOK_NAME),
            PathBuf::from("/reports/Libro_Vuelos.html")
        );
    }

    #[tokio::test]
    async fn test_write_to_primary() {
        let dir = tempfile::tempdir().unwrap();
        let placement = ReportPlacement::new(dir.path());

        let path = placement
            .write(Some(FlightType::Operational), "Flight_3", "<html></html>")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("Operativo").join("Flight_3.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }

    #[tokio::test]
    async fn test_falls_back_to_legacy_location() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the type directory should be blocks the primary path.
        std::fs::write(dir.path().join("Ensayo"), "not a directory").unwrap();
        let placement = ReportPlacement::new(dir.path());

        let path = placement
            .write(Some(FlightType::Test), "Flight_4", "report")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("Flight_4.html"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_fails_when_no_location_is_writable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("reports");
        std::fs::write(&blocker, "file, not directory").unwrap();
        let placement = ReportPlacement::new(&blocker);

        let err = placement
            .write(Some(FlightType::Test), "Flight_5", "report")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReportPlacement { .. }));
    }
}

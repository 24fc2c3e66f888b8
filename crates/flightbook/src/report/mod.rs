//! Flight report generation.
//!
//! A [`ReportRenderer`] turns a [`Document`] into report text. The
//! [`ReportWriter`] bounds rendering with a timeout, falls back to a minimal
//! report when the full one cannot be produced, and places the result on
//! disk through [`paths::ReportPlacement`].

pub mod html;
pub mod paths;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Aircraft, Flight, Pilot};
pub use html::HtmlRenderer;
pub use paths::{aborted_report_name, flight_report_name, ReportPlacement, FLIGHT_BOOK_NAME};

/// A crew role resolved to a pilot name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewMember {
    /// Role label, e.g. `Internal Pilot`.
    pub role: &'static str,
    /// Pilot id.
    pub pilot_id: i64,
    /// Pilot name, or the id when the pilot is no longer registered.
    pub name: String,
}

/// Everything a flight report prints.
#[derive(Debug, Clone)]
pub struct FlightReport {
    /// The flight record.
    pub flight: Flight,
    /// The aircraft, if registered.
    pub aircraft: Option<Aircraft>,
    /// Crew with resolved names.
    pub crew: Vec<CrewMember>,
}

impl FlightReport {
    /// Assemble a report, resolving crew ids against `pilots`.
    #[must_use]
    pub fn new(flight: Flight, aircraft: Option<Aircraft>, pilots: &[Pilot]) -> Self {
        let crew = flight
            .crew
            .as_ref()
            .map(|crew| {
                crew.roles()
                    .into_iter()
                    .map(|(role, pilot_id)| CrewMember {
                        role,
                        pilot_id,
                        name: pilots
                            .iter()
                            .find(|p| p.id == Some(pilot_id))
                            .map_or_else(|| format!("#{pilot_id}"), |p| p.name.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            flight,
            aircraft,
            crew,
        }
    }

    /// The flight id, or zero for an unsaved record.
    #[must_use]
    pub fn flight_id(&self) -> i64 {
        self.flight.id.unwrap_or_default()
    }
}

/// A document to render.
#[derive(Debug, Clone, Copy)]
pub enum Document<'a> {
    /// The full flight report.
    Full {
        /// Report contents.
        report: &'a FlightReport,
        /// Title printed in the header.
        title: &'a str,
    },
    /// Identity, status, date and duration only.
    Minimal(&'a FlightReport),
    /// Report of an aborted flight.
    Aborted {
        /// Report contents.
        report: &'a FlightReport,
        /// Reason shown next to the status.
        reason: Option<&'a str>,
    },
    /// The flight book listing.
    FlightBook(&'a [Flight]),
}

impl Document<'_> {
    /// Short name used in logs and errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Full { .. } => "full report",
            Self::Minimal(_) => "minimal report",
            Self::Aborted { .. } => "aborted report",
            Self::FlightBook(_) => "flight book",
        }
    }
}

/// Run synchronous rendering work on the blocking pool.
///
/// Rendering that never yields would otherwise hold the runtime thread and
/// the writer's timeout could not fire.
///
/// # Errors
///
/// Returns the work's own error, or an internal error if the task panicked.
pub async fn render_blocking<F>(work: F) -> Result<String>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::internal(format!("render task failed: {e}")))?
}

/// Renders documents to text.
#[async_trait]
pub trait ReportRenderer: Send + Sync + std::fmt::Debug {
    /// Render a document.
    async fn render(&self, doc: &Document<'_>) -> Result<String>;
}

/// Renders and places reports.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    renderer: Arc<dyn ReportRenderer>,
    placement: ReportPlacement,
    timeout: Duration,
}

impl ReportWriter {
    /// HTML reports under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self::with_renderer(Arc::new(HtmlRenderer), ReportPlacement::new(root), timeout)
    }

    /// A writer with a custom renderer.
    #[must_use]
    pub fn with_renderer(
        renderer: Arc<dyn ReportRenderer>,
        placement: ReportPlacement,
        timeout: Duration,
    ) -> Self {
        Self {
            renderer,
            placement,
            timeout,
        }
    }

    /// A writer configured from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.reports_dir(), config.report_timeout())
    }

    /// Where reports are placed.
    #[must_use]
    pub fn placement(&self) -> &ReportPlacement {
        &self.placement
    }

    async fn render(&self, doc: &Document<'_>) -> Result<String> {
        tokio::time::timeout(self.timeout, self.renderer.render(doc))
            .await
            .map_err(|_| Error::Timeout {
                operation: format!("rendering {}", doc.kind()),
            })?
    }

    /// Write the full report of a flight, or a minimal one if that fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReportGeneration`] if neither report renders, or
    /// [`Error::ReportPlacement`] if it cannot be written.
    pub async fn write_flight_report(&self, report: &FlightReport, name: &str) -> Result<PathBuf> {
        let id = report.flight_id();
        let contents = match self
            .render(&Document::Full {
                report,
                title: name,
            })
            .await
        {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Full report for flight {} failed: {}; writing minimal report", id, e);
                self.render(&Document::Minimal(report))
                    .await
                    .map_err(|e| Error::report_generation(id, e.to_string()))?
            }
        };

        let path = self
            .placement
            .write(Some(report.flight.flight_type), name, &contents)
            .await?;
        info!("Report for flight {} written to {}", id, path.display());
        Ok(path)
    }

    /// Write the report of an aborted flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReportGeneration`] if it does not render, or
    /// [`Error::ReportPlacement`] if it cannot be written.
    pub async fn write_aborted_report(
        &self,
        report: &FlightReport,
        reason: Option<&str>,
    ) -> Result<PathBuf> {
        let id = report.flight_id();
        let contents = self
            .render(&Document::Aborted { report, reason })
            .await
            .map_err(|e| Error::report_generation(id, e.to_string()))?;
        let path = self
            .placement
            .write(
                Some(report.flight.flight_type),
                &aborted_report_name(id),
                &contents,
            )
            .await?;
        info!("Abort report for flight {} written to {}", id, path.display());
        Ok(path)
    }

    /// Write the flight book.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub async fn write_flight_book(&self, flights: &[Flight]) -> Result<PathBuf> {
        let contents = self.render(&Document::FlightBook(flights)).await?;
        self.placement.write(None, FLIGHT_BOOK_NAME, &contents).await
    }
}

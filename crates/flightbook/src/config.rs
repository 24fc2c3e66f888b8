//! Configuration management for flightbook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::MOTOR_OVERHAUL_MINUTES;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flightbook";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "dragom.db";

/// Default reports directory name, under the data directory.
const REPORTS_DIR_NAME: &str = "reports";

/// Prefix for environment overrides. Nested keys use a double underscore,
/// e.g. `FLIGHTBOOK_REPORTS__TIMEOUT_SECS`.
const ENV_PREFIX: &str = "FLIGHTBOOK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLIGHTBOOK_`)
/// 2. TOML config file at `~/.config/flightbook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Report configuration.
    pub reports: ReportsConfig,
    /// Flight lifecycle configuration.
    pub lifecycle: LifecycleConfig,
    /// Maintenance thresholds.
    pub maintenance: MaintenanceConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/flightbook/dragom.db`
    pub database_path: Option<PathBuf>,
}

/// Report-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Root directory for report files.
    /// Defaults to `~/.local/share/flightbook/reports`
    pub directory: Option<PathBuf>,
    /// Time allowed for a full report render before falling back to the
    /// minimal report.
    pub timeout_secs: u64,
}

/// Flight lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Interval of the elapsed-time ticker in milliseconds.
    pub tick_interval_ms: u64,
    /// Upper bound on the startup sweep.
    pub sweep_timeout_secs: u64,
    /// How long an in-progress flight may go without any lifecycle command
    /// or watcher touching it before the startup sweep aborts it.
    pub stale_after_secs: u64,
}

/// Maintenance thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Motor usage in minutes at which a maintenance alert is raised.
    pub motor_limit_minutes: u64,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: None, // Will be resolved to default at runtime
            timeout_secs: 10,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            sweep_timeout_secs: 30,
            stale_after_secs: 2 * 60 * 60,
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            motor_limit_minutes: MOTOR_OVERHAUL_MINUTES,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FLIGHTBOOK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.reports.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "reports.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.lifecycle.tick_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "lifecycle.tick_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.lifecycle.sweep_timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "lifecycle.sweep_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.lifecycle.stale_after_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "lifecycle.stale_after_secs must be greater than 0".to_string(),
            });
        }

        if self.maintenance.motor_limit_minutes == 0 {
            return Err(Error::ConfigValidation {
                message: "maintenance.motor_limit_minutes must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the reports directory, resolving defaults if not set.
    #[must_use]
    pub fn reports_dir(&self) -> PathBuf {
        self.reports
            .directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(REPORTS_DIR_NAME))
    }

    /// Get the report render timeout as a Duration.
    #[must_use]
    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.reports.timeout_secs)
    }

    /// Get the ticker interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.lifecycle.tick_interval_ms)
    }

    /// Get the startup sweep bound as a Duration.
    #[must_use]
    pub fn sweep_timeout(&self) -> Duration {
        Duration::from_secs(self.lifecycle.sweep_timeout_secs)
    }

    /// Get the in-progress lease length as a Duration.
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.lifecycle.stale_after_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!(config.reports.directory.is_none());
        assert_eq!(config.reports.timeout_secs, 10);
        assert_eq!(config.lifecycle.tick_interval_ms, 1_000);
        assert_eq!(config.lifecycle.sweep_timeout_secs, 30);
        assert_eq!(config.lifecycle.stale_after_secs, 7_200);
        assert_eq!(config.maintenance.motor_limit_minutes, 10_800);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_report_timeout() {
        let mut config = Config::default();
        config.reports.timeout_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("reports.timeout_secs"));
    }

    #[test]
    fn test_validate_zero_tick_interval() {
        let mut config = Config::default();
        config.lifecycle.tick_interval_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("tick_interval_ms"));
    }

    #[test]
    fn test_validate_zero_sweep_timeout() {
        let mut config = Config::default();
        config.lifecycle.sweep_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_motor_limit() {
        let mut config = Config::default();
        config.maintenance.motor_limit_minutes = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("dragom.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_reports_dir_default() {
        let path = Config::default().reports_dir();
        assert!(path.ends_with("flightbook/reports"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.report_timeout(), Duration::from_secs(10));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.sweep_timeout(), Duration::from_secs(30));
        assert_eq!(config.stale_after(), Duration::from_secs(7_200));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("flightbook"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[reports]\ndirectory = \"/srv/reports\"\ntimeout_secs = 3\n\n[maintenance]\nmotor_limit_minutes = 600\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.reports_dir(), PathBuf::from("/srv/reports"));
        assert_eq!(config.reports.timeout_secs, 3);
        assert_eq!(config.maintenance.motor_limit_minutes, 600);
        assert_eq!(config.lifecycle, LifecycleConfig::default());
    }

    #[test]
    fn test_load_reads_storage_and_lifecycle_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\ndatabase_path = \"/srv/flightbook/ops.db\"\n\n[lifecycle]\nstale_after_secs = 900\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/srv/flightbook/ops.db"));
        assert_eq!(config.lifecycle.stale_after_secs, 900);
        assert_eq!(config.lifecycle.tick_interval_ms, 1_000);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[lifecycle]\ntick_interval_ms = 0\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_reports_config_deserialize() {
        let reports: ReportsConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(reports.timeout_secs, 5);
        assert!(reports.directory.is_none());
    }

    #[test]
    fn test_config_serialize_sections() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        for section in ["storage", "reports", "lifecycle", "maintenance"] {
            assert!(json.contains(section));
        }
    }
}

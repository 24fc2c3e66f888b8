//! Error types for flightbook.
//!
//! This module defines all error types used throughout the flightbook crate,
//! providing detailed context for debugging and short messages suitable for
//! showing to the operator.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::FlightStatus;

/// The main error type for flightbook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Form Errors ===
    /// A form field failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    // === Lookup Errors ===
    /// No flight with the given id exists.
    #[error("flight {0} not found")]
    FlightNotFound(i64),

    /// No aircraft has been registered yet.
    #[error("no aircraft registered")]
    AircraftNotRegistered,

    // === Lifecycle Errors ===
    /// The requested operation is not allowed from the flight's current status.
    #[error("cannot {action} flight {id} while it is {from}")]
    InvalidTransition {
        /// Flight id.
        id: i64,
        /// Status the flight was in.
        from: FlightStatus,
        /// The operation that was attempted.
        action: &'static str,
    },

    /// Another flight is already in progress.
    #[error("flight {active} is already in progress")]
    FlightAlreadyActive {
        /// Id of the flight currently in progress.
        active: i64,
    },

    // === Report Errors ===
    /// Neither the full nor the minimal report could be produced.
    #[error("failed to generate report for flight {flight_id}: {message}")]
    ReportGeneration {
        /// Flight the report belongs to.
        flight_id: i64,
        /// Description of what went wrong.
        message: String,
    },

    /// The report could not be written to either the primary or the legacy location.
    #[error("failed to place report at {path}: {source}")]
    ReportPlacement {
        /// Last path that was attempted.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for flightbook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new form validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a report generation error.
    #[must_use]
    pub fn report_generation(flight_id: i64, message: impl Into<String>) -> Self {
        Self::ReportGeneration {
            flight_id,
            message: message.into(),
        }
    }

    /// Check if this error is an inline form validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error was caused by an illegal lifecycle transition.
    #[must_use]
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::FlightAlreadyActive { .. }
        )
    }

    /// Short, operator-facing text for a one-shot alert.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { field, message } => format!("{field}: {message}"),
            Self::FlightNotFound(id) => format!("Flight {id} does not exist"),
            Self::AircraftNotRegistered => "Register the aircraft first".to_string(),
            Self::InvalidTransition { .. } | Self::FlightAlreadyActive { .. } => self.to_string(),
            Self::ReportGeneration { .. } | Self::ReportPlacement { .. } => {
                "The flight report could not be generated".to_string()
            }
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. } => "Failed to save flight data".to_string(),
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => {
                "The configuration file is invalid".to_string()
            }
            _ => "Unexpected error".to_string(),
        }
    }
}

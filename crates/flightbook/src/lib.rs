//! `flightbook` - Flight operations record keeping for a UAV operator
//!
//! This library provides the flight lifecycle (scheduling, timing, payload
//! and phase tracking, completion and abort), usage accumulation into the
//! aircraft and its motors, the logbooks and the signed flight reports.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod checklist;
pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod report;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use lifecycle::FlightTracker;
pub use logging::init_logging;
pub use model::{Aircraft, Flight, FlightStatus, FlightType};
pub use report::ReportWriter;
pub use state::AppState;
pub use storage::{Storage, StorageStats};

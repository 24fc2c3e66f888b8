//! Core record types for flightbook.
//!
//! These are the entities persisted in the local database: the aircraft with
//! its motors, batteries and cameras, the owner and pilots, and flights with
//! their JSON sub-records.

pub mod aircraft;
pub mod crew;
pub mod flight;
pub mod units;

pub use aircraft::{Aircraft, Battery, Camera, Motor, MOTOR_OVERHAUL_MINUTES};
pub use crew::{IdType, Owner, Pilot};
pub use flight::{
    Crew, Equipment, Flight, FlightStatus, FlightType, PayloadState, Phase, PhaseName,
    PostFlight, PreFlight, Signatures, TimerLease,
};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a timestamp the way the records store it (`2024-05-01T13:45:00.000Z`).
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp.
///
/// Accepts full RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

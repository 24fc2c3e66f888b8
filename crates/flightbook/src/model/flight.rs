//! Flight records and their JSON sub-records.
//!
//! The sub-records (`crew`, `equipment`, `prevuelo`, `postvuelo`, `carga`,
//! `fases`, `signatures`) are stored as independent JSON columns. Their
//! field names follow the layout existing installs already hold.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightType {
    /// Operational mission.
    #[serde(rename = "Operativo")]
    Operational,
    /// Test flight, with phase tracking.
    #[serde(rename = "Ensayo")]
    Test,
}

impl FlightType {
    /// The stored name of this type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operational => "Operativo",
            Self::Test => "Ensayo",
        }
    }
}

impl std::fmt::Display for FlightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for FlightType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Operativo" => Ok(Self::Operational),
            "Ensayo" => Ok(Self::Test),
            other => Err(format!("unknown flight type: {other}")),
        }
    }
}

/// Lifecycle status of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightStatus {
    /// Pre-flight form submitted, timer not started.
    #[serde(rename = "Programado")]
    Scheduled,
    /// Timer running.
    #[serde(rename = "EnCurso")]
    InProgress,
    /// Flight ended normally.
    #[serde(rename = "Finalizado")]
    Completed,
    /// Flight cancelled, or force-closed after an unclean shutdown.
    #[serde(rename = "Abortado")]
    Aborted,
}

impl FlightStatus {
    /// The stored name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "Programado",
            Self::InProgress => "EnCurso",
            Self::Completed => "Finalizado",
            Self::Aborted => "Abortado",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for FlightStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Programado" => Ok(Self::Scheduled),
            "EnCurso" => Ok(Self::InProgress),
            "Finalizado" => Ok(Self::Completed),
            "Abortado" => Ok(Self::Aborted),
            other => Err(format!("unknown flight status: {other}")),
        }
    }
}

/// Crew assignment, by pilot id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crew {
    /// Pilot operating from inside the ground station.
    pub pilot_internal: i64,
    /// Pilot with visual line of sight.
    pub pilot_external: i64,
    /// Optional mission leader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_leader: Option<i64>,
    /// Optional flight engineer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_engineer: Option<i64>,
}

impl Crew {
    /// Signature role labels, with the pilot assigned to each.
    #[must_use]
    pub fn roles(&self) -> Vec<(&'static str, i64)> {
        let mut roles = vec![
            ("Internal Pilot", self.pilot_internal),
            ("External Pilot", self.pilot_external),
        ];
        if let Some(id) = self.mission_leader {
            roles.push(("Mission Leader", id));
        }
        if let Some(id) = self.flight_engineer {
            roles.push(("Flight Engineer", id));
        }
        roles
    }

    /// Roles whose signature is required on the post-flight report.
    #[must_use]
    pub fn required_signatures(&self) -> Vec<&'static str> {
        self.roles().into_iter().map(|(role, _)| role).collect()
    }

    /// All pilot ids on the crew.
    #[must_use]
    pub fn pilot_ids(&self) -> Vec<i64> {
        self.roles().into_iter().map(|(_, id)| id).collect()
    }
}

/// Equipment selected for the flight, by component id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Batteries used.
    pub batteries: Vec<String>,
    /// Mounted camera, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
}

/// Pre-flight form payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreFlight {
    /// Purpose of the flight.
    pub purpose: String,
    /// Estimated flight time in minutes, as entered.
    pub estimated_time: String,
    /// Location or coordinates.
    pub location: String,
}

/// Post-flight form payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFlight {
    /// Post-flight condition of the aircraft.
    pub status: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
}

/// Payload carried on the flight and whether it was released.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadState {
    /// Whether the flight carries a payload at all.
    pub has_payload: bool,
    /// Payload weight in kilograms, as entered.
    #[serde(default)]
    pub weight: String,
    /// Whether the payload has been released.
    #[serde(default)]
    pub released: bool,
    /// When the payload was released.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_time: Option<DateTime<Utc>>,
    /// Seconds between flight start and release.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_offset: Option<i64>,
}

impl PayloadState {
    /// Payload declared with the given weight.
    #[must_use]
    pub fn with_weight(weight: impl Into<String>) -> Self {
        Self {
            has_payload: true,
            weight: weight.into(),
            ..Self::default()
        }
    }

    /// No payload on board.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Last sign of life of an in-progress flight's timer, kept in the
/// `cronometro` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerLease {
    /// When a lifecycle command or watcher last touched the flight.
    pub last_seen: DateTime<Utc>,
}

/// Named sub-interval of a test flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseName {
    /// Climb.
    #[serde(rename = "Ascenso")]
    Ascent,
    /// Descent.
    #[serde(rename = "Descenso")]
    Descent,
    /// Horizontal displacement.
    #[serde(rename = "Desplazamiento")]
    Cruise,
    /// Climb while displacing.
    #[serde(rename = "Ascenso+Desp")]
    AscentCruise,
    /// Descent while displacing.
    #[serde(rename = "Descenso+Desp")]
    DescentCruise,
    /// Hover in place.
    #[serde(rename = "Hover")]
    Hover,
}

impl PhaseName {
    /// Every phase, in the order the operator is offered them.
    pub const ALL: [PhaseName; 6] = [
        Self::Ascent,
        Self::Descent,
        Self::Cruise,
        Self::AscentCruise,
        Self::DescentCruise,
        Self::Hover,
    ];

    /// The stored name of this phase.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascent => "Ascenso",
            Self::Descent => "Descenso",
            Self::Cruise => "Desplazamiento",
            Self::AscentCruise => "Ascenso+Desp",
            Self::DescentCruise => "Descenso+Desp",
            Self::Hover => "Hover",
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for PhaseName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown phase: {s}"))
    }
}

/// One entry of the phase log. Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Which phase.
    pub name: PhaseName,
    /// When the phase began.
    pub start_time: i64,
    /// When the phase was closed by the next marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Length in seconds, set together with `end_time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Phase {
    /// Whether the phase has not been closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Signature images keyed by crew role.
pub type Signatures = BTreeMap<String, String>;

/// A flight from scheduling through completion or abort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    /// Database id (assigned by storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Operational or test.
    #[serde(rename = "type")]
    pub flight_type: FlightType,
    /// Lifecycle status.
    pub status: FlightStatus,
    /// When the flight was scheduled.
    pub date: DateTime<Utc>,
    /// When the timer was started.
    pub start_time: Option<DateTime<Utc>>,
    /// When the flight was finished or aborted.
    pub end_time: Option<DateTime<Utc>>,
    /// Accumulated duration in whole seconds.
    #[serde(rename = "duration")]
    pub duration_secs: i64,
    /// Crew assignment.
    pub crew: Option<Crew>,
    /// Equipment selection.
    pub equipment: Option<Equipment>,
    /// Pre-flight form.
    #[serde(rename = "prevuelo")]
    pub preflight: Option<PreFlight>,
    /// Post-flight form.
    #[serde(rename = "postvuelo")]
    pub postflight: Option<PostFlight>,
    /// Payload state.
    #[serde(rename = "carga")]
    pub payload: Option<PayloadState>,
    /// Phase log (test flights).
    #[serde(rename = "fases")]
    pub phases: Vec<Phase>,
    /// Signature images.
    pub signatures: Option<Signatures>,
    /// Location of the generated report.
    #[serde(rename = "pdfPath")]
    pub report_path: Option<PathBuf>,
}

impl Flight {
    /// A freshly scheduled flight, as created by the pre-flight form.
    #[must_use]
    pub fn scheduled(
        flight_type: FlightType,
        date: DateTime<Utc>,
        crew: Crew,
        equipment: Equipment,
        preflight: PreFlight,
    ) -> Self {
        Self {
            id: None,
            flight_type,
            status: FlightStatus::Scheduled,
            date,
            start_time: None,
            end_time: None,
            duration_secs: 0,
            crew: Some(crew),
            equipment: Some(equipment),
            preflight: Some(preflight),
            postflight: None,
            payload: None,
            phases: Vec::new(),
            signatures: None,
            report_path: None,
        }
    }

    /// The database id, or an error for a record that was never stored.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the flight has no id.
    pub fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| Error::internal("flight record has no id"))
    }

    /// Whole seconds between start and `now`, or zero if not started.
    #[must_use]
    pub fn elapsed_secs_at(&self, now: DateTime<Utc>) -> i64 {
        self.start_time
            .map_or(0, |start| (now - start).num_seconds().max(0))
    }

    /// The phase currently open, if any.
    #[must_use]
    pub fn current_phase(&self) -> Option<PhaseName> {
        self.phases
            .last()
            .filter(|p| p.is_open())
            .map(|p| p.name)
    }

    /// Check the status/timestamp invariants of this record.
    #[must_use]
    pub fn timestamps_consistent(&self) -> bool {
        match self.status {
            FlightStatus::Scheduled => true,
            FlightStatus::InProgress => self.start_time.is_some() && self.end_time.is_none(),
            FlightStatus::Completed | FlightStatus::Aborted => self.end_time.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn crew() -> Crew {
        Crew {
            pilot_internal: 1,
            pilot_external: 2,
            mission_leader: None,
            flight_engineer: Some(4),
        }
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in [
            FlightStatus::Scheduled,
            FlightStatus::InProgress,
            FlightStatus::Completed,
            FlightStatus::Aborted,
        ] {
            assert_eq!(status.as_str().parse::<FlightStatus>().unwrap(), status);
        }
        assert!("Cancelled".parse::<FlightStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!FlightStatus::Scheduled.is_terminal());
        assert!(!FlightStatus::InProgress.is_terminal());
        assert!(FlightStatus::Completed.is_terminal());
        assert!(FlightStatus::Aborted.is_terminal());
    }

    #[test]
    fn test_required_signatures_follow_crew() {
        assert_eq!(
            crew().required_signatures(),
            vec!["Internal Pilot", "External Pilot", "Flight Engineer"]
        );
        assert_eq!(crew().pilot_ids(), vec![1, 2, 4]);
    }

    #[test]
    fn test_crew_json_layout() {
        let json = serde_json::to_string(&crew()).unwrap();
        assert_eq!(json, r#"{"pilotInternal":1,"pilotExternal":2,"flightEngineer":4}"#);
    }

    #[test]
    fn test_phase_name_parse_is_case_insensitive() {
        assert_eq!("hover".parse::<PhaseName>().unwrap(), PhaseName::Hover);
        assert_eq!(
            "Ascenso+Desp".parse::<PhaseName>().unwrap(),
            PhaseName::AscentCruise
        );
        assert!("Loiter".parse::<PhaseName>().is_err());
    }

    #[test]
    fn test_phase_json_omits_open_end() {
        let phase = Phase {
            name: PhaseName::Hover,
            start_time: 1_000,
            end_time: None,
            duration: None,
        };
        assert_eq!(
            serde_json::to_string(&phase).unwrap(),
            r#"{"name":"Hover","startTime":1000}"#
        );
    }

    #[test]
    fn test_elapsed_and_current_phase() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let mut flight = Flight::scheduled(
            FlightType::Test,
            start,
            crew(),
            Equipment::default(),
            PreFlight {
                purpose: "calibration".into(),
                estimated_time: "10".into(),
                location: "field".into(),
            },
        );
        assert_eq!(flight.elapsed_secs_at(start), 0);
        flight.start_time = Some(start);
        assert_eq!(flight.elapsed_secs_at(start + chrono::Duration::seconds(95)), 95);

        flight.phases.push(Phase {
            name: PhaseName::Ascent,
            start_time: 0,
            end_time: None,
            duration: None,
        });
        assert_eq!(flight.current_phase(), Some(PhaseName::Ascent));
        flight.phases[0].end_time = Some(10);
        assert_eq!(flight.current_phase(), None);
    }

    #[test]
    fn test_timestamps_consistent() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let mut flight = Flight::scheduled(
            FlightType::Operational,
            now,
            crew(),
            Equipment::default(),
            PreFlight {
                purpose: "survey".into(),
                estimated_time: "20".into(),
                location: "north".into(),
            },
        );
        flight.status = FlightStatus::InProgress;
        assert!(!flight.timestamps_consistent());
        flight.start_time = Some(now);
        assert!(flight.timestamps_consistent());
        flight.status = FlightStatus::Aborted;
        assert!(!flight.timestamps_consistent());
        flight.end_time = Some(now);
        assert!(flight.timestamps_consistent());
    }
}

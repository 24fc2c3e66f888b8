//! Application state shared by the commands of one run.
//!
//! Loaded from storage once and passed down explicitly.

use serde::Serialize;

use crate::error::Result;
use crate::model::{Aircraft, Flight, Pilot};
use crate::storage::Storage;

/// The registered aircraft, the flight in progress and the pilot roster.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// The aircraft, once registered.
    pub aircraft: Option<Aircraft>,
    /// The flight currently in progress, if any.
    pub current_flight: Option<Flight>,
    /// Registered pilots, by name.
    pub pilots: Vec<Pilot>,
}

/// Dashboard summary of the installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Aircraft name.
    pub aircraft_name: Option<String>,
    /// Aircraft registration code.
    pub aircraft_code: Option<String>,
    /// Total flight time, `Xh Ym`.
    pub total_time: Option<String>,
    /// Total flight time in minutes.
    pub total_minutes: u64,
    /// Number of motors.
    pub motor_count: usize,
    /// Id of the flight in progress.
    pub active_flight: Option<i64>,
    /// Motors due for maintenance.
    pub alerts: Vec<String>,
    /// Registered pilots.
    pub pilot_count: usize,
}

impl AppState {
    /// Load the state from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn load(storage: &Storage) -> Result<Self> {
        let aircraft = storage.aircraft()?;
        let current_flight = match storage.active_flight_id()? {
            Some(id) => storage.flight(id)?,
            None => None,
        };
        let pilots = storage.pilots()?;
        Ok(Self {
            aircraft,
            current_flight,
            pilots,
        })
    }

    /// Whether an aircraft has been registered.
    #[must_use]
    pub fn has_aircraft(&self) -> bool {
        self.aircraft.is_some()
    }

    /// Summarize the state, flagging motors at or over `motor_limit_minutes`.
    #[must_use]
    pub fn dashboard(&self, motor_limit_minutes: u64) -> Dashboard {
        let aircraft = self.aircraft.as_ref();
        Dashboard {
            aircraft_name: aircraft.map(|a| a.name.clone()),
            aircraft_code: aircraft.map(|a| a.code.clone()),
            total_time: aircraft.map(Aircraft::total_time_display),
            total_minutes: aircraft.map_or(0, |a| a.total_minutes),
            motor_count: aircraft.map_or(0, |a| a.motors.len()),
            active_flight: self.current_flight.as_ref().and_then(|f| f.id),
            alerts: aircraft
                .map(|a| a.maintenance_alerts(motor_limit_minutes))
                .unwrap_or_default(),
            pilot_count: self.pilots.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Motor, MOTOR_OVERHAUL_MINUTES};

    #[test]
    fn test_empty_state() {
        let storage = Storage::open_in_memory().unwrap();
        let state = AppState::load(&storage).unwrap();
        assert!(!state.has_aircraft());
        assert!(state.current_flight.is_none());

        let dashboard = state.dashboard(MOTOR_OVERHAUL_MINUTES);
        assert!(dashboard.aircraft_name.is_none());
        assert_eq!(dashboard.motor_count, 0);
        assert!(dashboard.alerts.is_empty());
    }

    #[test]
    fn test_dashboard_alerts() {
        let storage = Storage::open_in_memory().unwrap();
        let mut aircraft = Aircraft::new("Dragom", "HK-001");
        aircraft.total_minutes = 125;
        aircraft.motors = vec![
            Motor::new("M1", MOTOR_OVERHAUL_MINUTES),
            Motor::new("M2", MOTOR_OVERHAUL_MINUTES - 1),
        ];
        storage.insert_aircraft(&aircraft).unwrap();

        let dashboard = AppState::load(&storage)
            .unwrap()
            .dashboard(MOTOR_OVERHAUL_MINUTES);
        assert_eq!(dashboard.aircraft_code.as_deref(), Some("HK-001"));
        assert_eq!(dashboard.total_time.as_deref(), Some("2h 5m"));
        assert_eq!(dashboard.motor_count, 2);
        assert_eq!(dashboard.alerts.len(), 1);
        assert!(dashboard.alerts[0].contains("M1"));
    }
}

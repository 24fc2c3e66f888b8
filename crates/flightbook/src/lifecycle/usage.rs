//! Usage accumulation for completed flights.

use serde::Serialize;

use crate::model::Aircraft;

/// Whole minutes credited for a flight of the given length.
///
/// Seconds past the last full minute are dropped: 125 s credits 2 min.
#[must_use]
pub fn flown_minutes(duration_secs: i64) -> u64 {
    u64::try_from(duration_secs.max(0) / 60).unwrap_or(0)
}

/// What a completed flight added to the aircraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageUpdate {
    /// Aircraft that was credited.
    pub aircraft_id: i64,
    /// Minutes added to the total and to every motor.
    pub minutes: u64,
    /// Aircraft total after the update.
    pub total_minutes: u64,
}

/// Add `minutes` to the aircraft total and to every motor.
///
/// Counters saturate rather than wrap.
pub fn apply(aircraft: &mut Aircraft, minutes: u64) {
    aircraft.total_minutes = aircraft.total_minutes.saturating_add(minutes);
    for motor in &mut aircraft.motors {
        motor.usage_minutes = motor.usage_minutes.saturating_add(minutes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Motor;

    #[test]
    fn test_flown_minutes_floors() {
        assert_eq!(flown_minutes(0), 0);
        assert_eq!(flown_minutes(59), 0);
        assert_eq!(flown_minutes(60), 1);
        assert_eq!(flown_minutes(125), 2);
        assert_eq!(flown_minutes(-30), 0);
    }

    #[test]
    fn test_apply_credits_total_and_every_motor() {
        let mut aircraft = Aircraft::new("Dragom", "HK-001");
        aircraft.total_minutes = 10;
        aircraft.motors = vec![Motor::new("M1", 0), Motor::new("M2", 100)];

        apply(&mut aircraft, 2);

        assert_eq!(aircraft.total_minutes, 12);
        assert_eq!(aircraft.motors[0].usage_minutes, 2);
        assert_eq!(aircraft.motors[1].usage_minutes, 102);
    }

    #[test]
    fn test_apply_saturates() {
        let mut aircraft = Aircraft::new("Dragom", "HK-001");
        aircraft.total_minutes = u64::MAX;
        apply(&mut aircraft, 5);
        assert_eq!(aircraft.total_minutes, u64::MAX);
    }
}

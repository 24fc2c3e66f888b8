//! Usage-unit conversion at the input and display edges.
//!
//! Motor usage and aircraft totals are stored as integer minutes. Older
//! records and operator input may carry a clock-like `HH:MM` string instead;
//! those are decoded here and never written back.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

fn clock_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(\d+):(\d{2})\s*$").expect("valid clock pattern"))
}

/// Decode a usage value entered as `HH:MM` or as plain minutes.
///
/// `"02:05"` is 125 minutes, `"90"` is 90 minutes.
#[must_use]
pub fn parse_usage(value: &str) -> Option<u64> {
    if let Some(caps) = clock_pattern().captures(value) {
        let hours: u64 = caps[1].parse().ok()?;
        let minutes: u64 = caps[2].parse().ok()?;
        return hours.checked_mul(60)?.checked_add(minutes);
    }
    value.trim().parse().ok()
}

/// Format minutes as `HH:MM`, the way usage is entered.
#[must_use]
pub fn format_clock(minutes: u64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Format minutes as `Xh Ym`, the way totals are displayed.
#[must_use]
pub fn format_hours(minutes: u64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Format a duration in seconds as `Xm Ys`.
#[must_use]
pub fn format_duration_secs(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Format a duration in seconds as `HH:MM:SS`.
#[must_use]
pub fn format_stopwatch(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(u64),
    Float(f64),
    Text(String),
}

impl RawCount {
    /// Blank text reads as zero. Any other text that does not decode is an
    /// error, so a counter is never silently reset.
    fn into_u64(self, text: fn(&str) -> Option<u64>) -> Result<u64, String> {
        match self {
            Self::Int(v) => Ok(v),
            // Truncation is intended: fractional minutes are dropped.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Self::Float(v) => Ok(v.max(0.0).floor() as u64),
            Self::Text(s) if s.trim().is_empty() => Ok(0),
            Self::Text(s) => text(&s).ok_or_else(|| format!("unreadable value {s:?}")),
        }
    }
}

/// Serde helper: read motor usage stored as minutes or as an `HH:MM` string.
///
/// # Errors
///
/// Returns an error if the value is neither a number nor a string, or is a
/// string that is not a usage value.
pub fn deserialize_minutes<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    RawCount::deserialize(deserializer)?
        .into_u64(parse_usage)
        .map_err(D::Error::custom)
}

/// Serde helper: read a counter stored as a number or a numeric string.
///
/// # Errors
///
/// Returns an error if the value is neither a number nor a numeric string.
pub fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = RawCount::deserialize(deserializer)?
        .into_u64(|s| s.trim().parse().ok())
        .map_err(D::Error::custom)?;
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usage_clock() {
        assert_eq!(parse_usage("00:00"), Some(0));
        assert_eq!(parse_usage("02:05"), Some(125));
        assert_eq!(parse_usage("180:00"), Some(10_800));
    }

    #[test]
    fn test_parse_usage_minutes() {
        assert_eq!(parse_usage("90"), Some(90));
        assert_eq!(parse_usage(" 7 "), Some(7));
    }

    #[test]
    fn test_parse_usage_rejects_garbage() {
        assert_eq!(parse_usage("2h"), None);
        assert_eq!(parse_usage("1:5"), None);
        assert_eq!(parse_usage(""), None);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(125), "02:05");
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(125), "2h 5m");
        assert_eq!(format_hours(0), "0h 0m");
    }

    #[test]
    fn test_format_durations() {
        assert_eq!(format_duration_secs(125), "2m 5s");
        assert_eq!(format_stopwatch(3725), "01:02:05");
        assert_eq!(format_stopwatch(-4), "00:00:00");
    }

    #[derive(Debug, Deserialize)]
    struct MotorHours {
        #[serde(deserialize_with = "deserialize_minutes")]
        hours: u64,
    }

    #[test]
    fn test_deserialize_minutes_accepts_both_representations() {
        let from_clock: MotorHours = serde_json::from_str(r#"{"hours": "01:30"}"#).unwrap();
        assert_eq!(from_clock.hours, 90);
        let from_int: MotorHours = serde_json::from_str(r#"{"hours": 42}"#).unwrap();
        assert_eq!(from_int.hours, 42);
        let from_float: MotorHours = serde_json::from_str(r#"{"hours": 12.9}"#).unwrap();
        assert_eq!(from_float.hours, 12);
    }

    #[test]
    fn test_deserialize_minutes_rejects_unreadable_text() {
        let blank: MotorHours = serde_json::from_str(r#"{"hours": " "}"#).unwrap();
        assert_eq!(blank.hours, 0);

        let err = serde_json::from_str::<MotorHours>(r#"{"hours": "dos horas"}"#).unwrap_err();
        assert!(err.to_string().contains("dos horas"));
    }
}

//! The registered aircraft and its components.

use serde::{Deserialize, Serialize};

use super::units::{deserialize_count, deserialize_minutes, format_clock, format_hours};

/// Motor usage at which a maintenance alert is raised (180 hours).
pub const MOTOR_OVERHAUL_MINUTES: u64 = 180 * 60;

/// A motor and its cumulative usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motor {
    /// Component identifier, defaults to the code.
    #[serde(default)]
    pub id: String,
    /// Motor code as printed on the part.
    pub code: String,
    /// Cumulative usage in minutes.
    #[serde(rename = "hours", default, deserialize_with = "deserialize_minutes")]
    pub usage_minutes: u64,
}

impl Motor {
    /// Create a motor with the given code and usage.
    #[must_use]
    pub fn new(code: impl Into<String>, usage_minutes: u64) -> Self {
        let code = code.into();
        Self {
            id: code.clone(),
            code,
            usage_minutes,
        }
    }

    /// Usage formatted as `HH:MM`.
    #[must_use]
    pub fn usage_clock(&self) -> String {
        format_clock(self.usage_minutes)
    }
}

/// A flight battery and its charge cycle count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battery {
    /// Component identifier, defaults to the code.
    #[serde(default)]
    pub id: String,
    /// Battery code.
    pub code: String,
    /// Charge cycles so far.
    #[serde(default, deserialize_with = "deserialize_count")]
    pub cycles: u32,
}

impl Battery {
    /// Create a battery with the given code and cycle count.
    #[must_use]
    pub fn new(code: impl Into<String>, cycles: u32) -> Self {
        let code = code.into();
        Self {
            id: code.clone(),
            code,
            cycles,
        }
    }
}

/// A camera or other sensor payload that can be mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    /// Component identifier, defaults to the code.
    #[serde(default)]
    pub id: String,
    /// Camera code.
    pub code: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl Camera {
    /// Create a camera with the given code and description.
    #[must_use]
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            id: code.clone(),
            code,
            description: description.into(),
        }
    }
}

/// The aircraft operated by this installation.
///
/// Only one aircraft is tracked; the first registered row is the one
/// flights accumulate usage into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aircraft {
    /// Database id (assigned by storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Registration code, unique.
    pub code: String,
    /// Manufacturer part number.
    pub part_num: Option<String>,
    /// Manufacturer serial number.
    pub serial_num: Option<String>,
    /// Installed motors.
    pub motors: Vec<Motor>,
    /// Main battery set.
    pub batteries_main: Vec<Battery>,
    /// Spare battery set.
    pub batteries_spare: Vec<Battery>,
    /// Mountable cameras.
    pub cameras: Vec<Camera>,
    /// Total flight time in minutes.
    #[serde(rename = "totalHours")]
    pub total_minutes: u64,
}

impl Aircraft {
    /// Create an aircraft with no components and no flight time.
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            code: code.into(),
            part_num: None,
            serial_num: None,
            motors: Vec::new(),
            batteries_main: Vec::new(),
            batteries_spare: Vec::new(),
            cameras: Vec::new(),
            total_minutes: 0,
        }
    }

    /// Fill in component ids that were left empty, using the component code.
    pub fn assign_missing_ids(&mut self) {
        for motor in &mut self.motors {
            if motor.id.is_empty() {
                motor.id.clone_from(&motor.code);
            }
        }
        for battery in self
            .batteries_main
            .iter_mut()
            .chain(self.batteries_spare.iter_mut())
        {
            if battery.id.is_empty() {
                battery.id.clone_from(&battery.code);
            }
        }
        for camera in &mut self.cameras {
            if camera.id.is_empty() {
                camera.id.clone_from(&camera.code);
            }
        }
    }

    /// Iterate over main and spare batteries.
    pub fn batteries(&self) -> impl Iterator<Item = &Battery> {
        self.batteries_main.iter().chain(self.batteries_spare.iter())
    }

    /// Look up a battery by id.
    #[must_use]
    pub fn battery(&self, id: &str) -> Option<&Battery> {
        self.batteries().find(|b| b.id == id)
    }

    /// Look up a camera by id.
    #[must_use]
    pub fn camera(&self, id: &str) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.id == id)
    }

    /// Total flight time formatted as `Xh Ym`.
    #[must_use]
    pub fn total_time_display(&self) -> String {
        format_hours(self.total_minutes)
    }

    /// Maintenance alerts for motors at or past the given usage limit.
    #[must_use]
    pub fn maintenance_alerts(&self, limit_minutes: u64) -> Vec<String> {
        self.motors
            .iter()
            .filter(|m| m.usage_minutes >= limit_minutes)
            .map(|m| {
                format!(
                    "Motor {} has exceeded {} hours!",
                    m.code,
                    limit_minutes / 60
                )
            })
            .collect()
    }
}

//! Input validation for registration, pre-flight and post-flight forms.
//!
//! Every form turns raw operator input into a model record or a
//! [`Error::Validation`] naming the first offending field.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::units::parse_usage;
use crate::model::{
    parse_timestamp, Aircraft, Battery, Camera, Crew, Equipment, Flight, FlightType, IdType,
    Motor, Owner, Pilot, PostFlight, PreFlight, Signatures,
};

/// A compiled field pattern.
#[derive(Debug)]
pub struct FieldPattern {
    /// Name of the pattern for identification.
    pub name: &'static str,

    /// Message shown when a value does not match.
    pub message: &'static str,

    regex: Regex,
}

impl FieldPattern {
    /// Create a new field pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(name: &'static str, message: &'static str, pattern: &str) -> Self {
        Self {
            name,
            message,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Check if the value matches this pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Validate `value` for `field`.
    ///
    /// # Errors
    ///
    /// Returns a validation error carrying this pattern's message.
    pub fn check(&self, field: &str, value: &str) -> Result<()> {
        if self.matches(value) {
            Ok(())
        } else {
            Err(Error::validation(field, self.message))
        }
    }
}

/// Pattern for report file names.
pub fn report_name_pattern() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| {
        FieldPattern::new("report_name", "Invalid characters", r"^[A-Za-z0-9_-]+$")
    })
}

/// Pattern for motor usage entered as a clock.
pub fn usage_clock_pattern() -> &'static FieldPattern {
    static PATTERN: OnceLock<FieldPattern> = OnceLock::new();
    PATTERN.get_or_init(|| FieldPattern::new("usage_clock", "Format HH:MM", r"^\d+:\d{2}$"))
}

/// Trim `value` and reject it if empty.
///
/// # Errors
///
/// Returns a validation error with message `Required`.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::validation(field, "Required"))
    } else {
        Ok(trimmed)
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Check a declared payload weight: present, numeric and positive.
///
/// # Errors
///
/// Returns a validation error on the `weight` field.
pub fn validate_payload_weight(weight: &str) -> Result<f64> {
    let value = required("weight", weight)?;
    match value.parse::<f64>() {
        Ok(kg) if kg.is_finite() && kg > 0.0 => Ok(kg),
        _ => Err(Error::validation("weight", "Please enter valid payload weight")),
    }
}

/// Motor entry on the aircraft form.
#[derive(Debug, Clone, Default)]
pub struct MotorInput {
    /// Motor code.
    pub code: String,
    /// Usage so far, as `HH:MM` or minutes.
    pub usage: String,
}

/// Battery entry on the aircraft form.
#[derive(Debug, Clone, Default)]
pub struct BatteryInput {
    /// Battery code.
    pub code: String,
    /// Cycle count as entered. Non-numeric input counts as zero.
    pub cycles: String,
}

/// Camera entry on the aircraft form.
#[derive(Debug, Clone, Default)]
pub struct CameraInput {
    /// Camera code.
    pub code: String,
    /// Free-form description.
    pub description: String,
}

/// Aircraft registration form.
#[derive(Debug, Clone, Default)]
pub struct AircraftForm {
    /// Display name.
    pub name: String,
    /// Registration code.
    pub code: String,
    /// Manufacturer part number.
    pub part_num: Option<String>,
    /// Manufacturer serial number.
    pub serial_num: Option<String>,
    /// Installed motors.
    pub motors: Vec<MotorInput>,
    /// Main battery set.
    pub batteries_main: Vec<BatteryInput>,
    /// Spare battery set.
    pub batteries_spare: Vec<BatteryInput>,
    /// Mountable cameras.
    pub cameras: Vec<CameraInput>,
}

impl AircraftForm {
    /// Validate and build the aircraft record.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first invalid field.
    pub fn into_aircraft(self) -> Result<Aircraft> {
        let mut aircraft = Aircraft::new(
            required("name", &self.name)?,
            required("code", &self.code)?,
        );
        aircraft.part_num = optional(self.part_num.as_deref());
        aircraft.serial_num = optional(self.serial_num.as_deref());

        for (i, motor) in self.motors.iter().enumerate() {
            let code = required(&format!("motors[{i}].code"), &motor.code)?;
            let usage = motor.usage.trim();
            let minutes = if usage.is_empty() {
                0
            } else {
                parse_usage(usage).ok_or_else(|| {
                    Error::validation(
                        format!("motors[{i}].hours"),
                        usage_clock_pattern().message,
                    )
                })?
            };
            aircraft.motors.push(Motor::new(code, minutes));
        }

        aircraft.batteries_main = batteries("batteriesMain", &self.batteries_main)?;
        aircraft.batteries_spare = batteries("batteriesSpare", &self.batteries_spare)?;

        for (i, camera) in self.cameras.iter().enumerate() {
            let code = required(&format!("cameras[{i}].code"), &camera.code)?;
            aircraft
                .cameras
                .push(Camera::new(code, camera.description.trim()));
        }

        Ok(aircraft)
    }
}

fn batteries(field: &str, inputs: &[BatteryInput]) -> Result<Vec<Battery>> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let code = required(&format!("{field}[{i}].code"), &b.code)?;
            Ok(Battery::new(code, b.cycles.trim().parse().unwrap_or(0)))
        })
        .collect()
}

/// Owner registration form.
#[derive(Debug, Clone, Default)]
pub struct OwnerForm {
    /// Person or company name.
    pub name: String,
    /// `CC` or `NIT`.
    pub id_type: String,
    /// Document number.
    pub id_num: String,
}

impl OwnerForm {
    /// Validate and build the owner record.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first invalid field.
    pub fn into_owner(self) -> Result<Owner> {
        let name = required("name", &self.name)?.to_string();
        let id_type: IdType = self
            .id_type
            .parse()
            .map_err(|e: String| Error::validation("idType", e))?;
        let id_num = required("idNum", &self.id_num)?.to_string();
        Ok(Owner {
            id: None,
            name,
            id_type,
            id_num,
        })
    }
}

/// Pilot registration form.
#[derive(Debug, Clone, Default)]
pub struct PilotForm {
    /// Full name.
    pub name: String,
    /// National id number.
    pub cc: String,
    /// License number.
    pub license_num: String,
    /// License category.
    pub license_type: String,
    /// License expiry, `YYYY-MM-DD` or RFC 3339.
    pub license_expiry: String,
}

impl PilotForm {
    /// Validate and build the pilot record.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first invalid field.
    pub fn into_pilot(self) -> Result<Pilot> {
        Ok(Pilot {
            id: None,
            name: required("name", &self.name)?.to_string(),
            cc: required("cc", &self.cc)?.to_string(),
            license_num: required("licenseNum", &self.license_num)?.to_string(),
            license_type: required("licenseType", &self.license_type)?.to_string(),
            license_expiry: parse_timestamp(required("licenseExpiry", &self.license_expiry)?)
                .ok_or_else(|| Error::validation("licenseExpiry", "Expected YYYY-MM-DD"))?,
        })
    }
}

/// Pre-flight form, submitted to schedule a flight.
#[derive(Debug, Clone)]
pub struct PreFlightForm {
    /// Operational or test.
    pub flight_type: FlightType,
    /// Crew assignment.
    pub crew: Crew,
    /// Selected battery ids.
    pub batteries: Vec<String>,
    /// Selected camera id.
    pub camera: Option<String>,
    /// Purpose of the flight.
    pub purpose: String,
    /// Estimated flight time in minutes.
    pub estimated_time: String,
    /// Location or coordinates.
    pub location: String,
}

impl PreFlightForm {
    /// Validate against the registered pilots and aircraft and build a
    /// scheduled flight dated `date`.
    ///
    /// Every assigned pilot must hold a license valid at `date`. Selected
    /// batteries and camera must belong to the aircraft.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first invalid field.
    pub fn into_flight(
        self,
        date: DateTime<Utc>,
        pilots: &[Pilot],
        aircraft: &Aircraft,
    ) -> Result<Flight> {
        for (role, id) in self.crew.roles() {
            let field = role_field(role);
            let pilot = pilots
                .iter()
                .find(|p| p.id == Some(id))
                .ok_or_else(|| Error::validation(field, format!("unknown pilot {id}")))?;
            if !pilot.is_license_valid_at(date) {
                return Err(Error::validation(
                    field,
                    format!("license of {} has expired", pilot.name),
                ));
            }
        }

        if self.batteries.is_empty() {
            return Err(Error::validation("batteries", "Select at least one battery"));
        }
        for id in &self.batteries {
            if aircraft.battery(id).is_none() {
                return Err(Error::validation("batteries", format!("unknown battery {id}")));
            }
        }
        let camera = optional(self.camera.as_deref());
        if let Some(id) = &camera {
            if aircraft.camera(id).is_none() {
                return Err(Error::validation("camera", format!("unknown camera {id}")));
            }
        }

        let purpose = required("purpose", &self.purpose)?.to_string();
        let estimated_time = required("estimatedTime", &self.estimated_time)?;
        if estimated_time.parse::<f64>().map_or(true, |m| !m.is_finite() || m < 0.0) {
            return Err(Error::validation("estimatedTime", "Expected minutes"));
        }
        let location = required("location", &self.location)?.to_string();

        Ok(Flight::scheduled(
            self.flight_type,
            date,
            self.crew,
            Equipment {
                batteries: self.batteries,
                camera,
            },
            PreFlight {
                purpose,
                estimated_time: estimated_time.to_string(),
                location,
            },
        ))
    }
}

fn role_field(role: &str) -> &'static str {
    match role {
        "Internal Pilot" => "pilotInternal",
        "External Pilot" => "pilotExternal",
        "Mission Leader" => "missionLeader",
        _ => "flightEngineer",
    }
}

/// Post-flight form, submitted to close a completed flight.
#[derive(Debug, Clone, Default)]
pub struct PostFlightForm {
    /// Post-flight condition of the aircraft.
    pub status: String,
    /// Free-form notes.
    pub notes: String,
    /// File name for the report, without extension.
    pub report_name: String,
    /// Signature images keyed by role.
    pub signatures: Signatures,
}

/// A validated post-flight form.
#[derive(Debug, Clone)]
pub struct ValidPostFlight {
    /// Record to persist.
    pub postflight: PostFlight,
    /// Report file name.
    pub report_name: String,
    /// Signatures to persist and print.
    pub signatures: Signatures,
}

impl PostFlightForm {
    /// Validate the form for a flight with the given crew.
    ///
    /// A missing crew record requires the two pilot signatures only.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first invalid field, or listing
    /// every missing signature.
    pub fn validate(self, crew: Option<&Crew>) -> Result<ValidPostFlight> {
        let status = required("status", &self.status)?.to_string();
        let report_name = required("reportName", &self.report_name)?.to_string();
        report_name_pattern().check("reportName", &report_name)?;

        let roles = crew.map_or_else(
            || vec!["Internal Pilot", "External Pilot"],
            Crew::required_signatures,
        );
        let missing: Vec<&str> = roles
            .into_iter()
            .filter(|role| {
                self.signatures
                    .get(*role)
                    .map_or(true, |s| s.trim().is_empty())
            })
            .collect();
        if !missing.is_empty() {
            return Err(Error::validation(
                "signatures",
                format!("Missing required signatures: {}", missing.join(", ")),
            ));
        }

        Ok(ValidPostFlight {
            postflight: PostFlight {
                status,
                notes: self.notes.trim().to_string(),
            },
            report_name,
            signatures: self.signatures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn field_of(err: Error) -> String {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn pilots() -> Vec<Pilot> {
        vec![
            Pilot {
                id: Some(1),
                name: "Ana".into(),
                cc: "1".into(),
                license_num: "L1".into(),
                license_type: "RPAS".into(),
                license_expiry: now() + chrono::Duration::days(90),
            },
            Pilot {
                id: Some(2),
                name: "Luis".into(),
                cc: "2".into(),
                license_num: "L2".into(),
                license_type: "RPAS".into(),
                license_expiry: now() + chrono::Duration::days(90),
            },
            Pilot {
                id: Some(3),
                name: "Old".into(),
                cc: "3".into(),
                license_num: "L3".into(),
                license_type: "RPAS".into(),
                license_expiry: now() - chrono::Duration::days(1),
            },
        ]
    }

    fn aircraft() -> Aircraft {
        AircraftForm {
            name: "Dragom".into(),
            code: "HK-001".into(),
            motors: vec![MotorInput {
                code: "M1".into(),
                usage: "01:30".into(),
            }],
            batteries_main: vec![BatteryInput {
                code: "B1".into(),
                cycles: "3".into(),
            }],
            cameras: vec![CameraInput {
                code: "CAM".into(),
                description: "RGB".into(),
            }],
            ..AircraftForm::default()
        }
        .into_aircraft()
        .unwrap()
    }

    fn preflight() -> PreFlightForm {
        PreFlightForm {
            flight_type: FlightType::Operational,
            crew: Crew {
                pilot_internal: 1,
                pilot_external: 2,
                mission_leader: None,
                flight_engineer: None,
            },
            batteries: vec!["B1".into()],
            camera: Some("CAM".into()),
            purpose: "Survey".into(),
            estimated_time: "20".into(),
            location: "4.6,-74.1".into(),
        }
    }

    #[test]
    fn test_report_name_pattern() {
        let pattern = report_name_pattern();
        assert!(pattern.matches("Mission_01-b"));
        assert!(!pattern.matches("bad name"));
        assert!(!pattern.matches("../escape"));
        assert!(!pattern.matches(""));
    }

    #[test]
    fn test_usage_clock_pattern() {
        assert!(usage_clock_pattern().matches("180:00"));
        assert!(!usage_clock_pattern().matches("1:5"));
    }

    #[test]
    fn test_payload_weight() {
        assert_eq!(validate_payload_weight(" 1.5 ").unwrap(), 1.5);
        assert!(validate_payload_weight("").is_err());
        assert!(validate_payload_weight("heavy").is_err());
        assert!(validate_payload_weight("0").is_err());
        assert!(validate_payload_weight("NaN").is_err());
    }

    #[test]
    fn test_aircraft_form_parses_usage() {
        let aircraft = aircraft();
        assert_eq!(aircraft.motors[0].usage_minutes, 90);
        assert_eq!(aircraft.batteries_main[0].cycles, 3);
        assert_eq!(aircraft.batteries_main[0].id, "B1");
        assert_eq!(aircraft.cameras[0].description, "RGB");
    }

    #[test]
    fn test_aircraft_form_accepts_plain_minutes() {
        let aircraft = AircraftForm {
            name: "D".into(),
            code: "C".into(),
            motors: vec![MotorInput {
                code: "M1".into(),
                usage: "45".into(),
            }],
            ..AircraftForm::default()
        }
        .into_aircraft()
        .unwrap();
        assert_eq!(aircraft.motors[0].usage_minutes, 45);
    }

    #[test]
    fn test_aircraft_form_rejects_bad_usage() {
        let err = AircraftForm {
            name: "D".into(),
            code: "C".into(),
            motors: vec![MotorInput {
                code: "M1".into(),
                usage: "1h30".into(),
            }],
            ..AircraftForm::default()
        }
        .into_aircraft()
        .unwrap_err();
        assert_eq!(field_of(err), "motors[0].hours");
    }

    #[test]
    fn test_aircraft_form_requires_name() {
        let err = AircraftForm::default().into_aircraft().unwrap_err();
        assert_eq!(field_of(err), "name");
    }

    #[test]
    fn test_owner_form() {
        let owner = OwnerForm {
            name: "Aero".into(),
            id_type: "nit".into(),
            id_num: "900".into(),
        }
        .into_owner()
        .unwrap();
        assert_eq!(owner.id_type, IdType::Nit);

        let err = OwnerForm {
            name: "Aero".into(),
            id_type: "passport".into(),
            id_num: "900".into(),
        }
        .into_owner()
        .unwrap_err();
        assert_eq!(field_of(err), "idType");
    }

    #[test]
    fn test_pilot_form() {
        let pilot = PilotForm {
            name: "Ana".into(),
            cc: "10".into(),
            license_num: "L".into(),
            license_type: "RPAS".into(),
            license_expiry: "2026-01-31".into(),
        }
        .into_pilot()
        .unwrap();
        assert_eq!(
            pilot.license_expiry,
            Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap()
        );

        let err = PilotForm {
            name: "Ana".into(),
            cc: "10".into(),
            license_num: "L".into(),
            license_type: "RPAS".into(),
            license_expiry: "soon".into(),
        }
        .into_pilot()
        .unwrap_err();
        assert_eq!(field_of(err), "licenseExpiry");
    }

    #[test]
    fn test_preflight_builds_scheduled_flight() {
        let flight = preflight().into_flight(now(), &pilots(), &aircraft()).unwrap();
        assert_eq!(flight.status, crate::model::FlightStatus::Scheduled);
        assert_eq!(flight.date, now());
        assert_eq!(flight.equipment.unwrap().camera.as_deref(), Some("CAM"));
    }

    #[test]
    fn test_preflight_rejects_expired_pilot() {
        let mut form = preflight();
        form.crew.flight_engineer = Some(3);
        let err = form.into_flight(now(), &pilots(), &aircraft()).unwrap_err();
        assert_eq!(field_of(err), "flightEngineer");
    }

    #[test]
    fn test_preflight_rejects_unknown_pilot() {
        let mut form = preflight();
        form.crew.pilot_external = 99;
        let err = form.into_flight(now(), &pilots(), &aircraft()).unwrap_err();
        assert_eq!(field_of(err), "pilotExternal");
    }

    #[test]
    fn test_preflight_requires_battery() {
        let mut form = preflight();
        form.batteries.clear();
        let err = form.into_flight(now(), &pilots(), &aircraft()).unwrap_err();
        assert_eq!(field_of(err), "batteries");

        let mut form = preflight();
        form.batteries = vec!["B9".into()];
        assert!(form.into_flight(now(), &pilots(), &aircraft()).is_err());
    }

    #[test]
    fn test_preflight_required_text_fields() {
        let mut form = preflight();
        form.location = "  ".into();
        let err = form.into_flight(now(), &pilots(), &aircraft()).unwrap_err();
        assert_eq!(field_of(err), "location");

        let mut form = preflight();
        form.estimated_time = "twenty".into();
        let err = form.into_flight(now(), &pilots(), &aircraft()).unwrap_err();
        assert_eq!(field_of(err), "estimatedTime");
    }

    fn signed(roles: &[&str]) -> Signatures {
        roles
            .iter()
            .map(|r| ((*r).to_string(), "data:image/png;base64,AAAA".to_string()))
            .collect()
    }

    #[test]
    fn test_postflight_requires_crew_signatures() {
        let crew = Crew {
            pilot_internal: 1,
            pilot_external: 2,
            mission_leader: Some(4),
            flight_engineer: None,
        };
        let form = PostFlightForm {
            status: "OK".into(),
            notes: String::new(),
            report_name: "Mission_1".into(),
            signatures: signed(&["Internal Pilot", "External Pilot"]),
        };
        let err = form.clone().validate(Some(&crew)).unwrap_err();
        assert!(err.to_string().contains("Mission Leader"));

        let mut form = form;
        form.signatures = signed(&["Internal Pilot", "External Pilot", "Mission Leader"]);
        let valid = form.validate(Some(&crew)).unwrap();
        assert_eq!(valid.report_name, "Mission_1");
        assert_eq!(valid.postflight.status, "OK");
    }

    #[test]
    fn test_postflight_rejects_bad_report_name() {
        let form = PostFlightForm {
            status: "OK".into(),
            notes: String::new(),
            report_name: "my report".into(),
            signatures: signed(&["Internal Pilot", "External Pilot"]),
        };
        let err = form.validate(None).unwrap_err();
        assert_eq!(err.to_string(), "invalid reportName: Invalid characters");
    }

    #[test]
    fn test_postflight_requires_status() {
        let form = PostFlightForm {
            report_name: "ok".into(),
            ..PostFlightForm::default()
        };
        assert_eq!(field_of(form.validate(None).unwrap_err()), "status");
    }
}

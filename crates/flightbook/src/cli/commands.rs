//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and turns their
//! arguments into the forms the library validates.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::checklist::Stage;
use crate::forms::{
    AircraftForm, BatteryInput, CameraInput, MotorInput, OwnerForm, PilotForm, PreFlightForm,
};
use crate::model::{Crew, FlightType, PhaseName};

/// Split a `KEY=VALUE` argument. A bare `KEY` has an empty value.
fn split_pair(arg: &str) -> (String, String) {
    match arg.split_once('=') {
        Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
        None => (arg.trim().to_string(), String::new()),
    }
}

/// Aircraft commands.
#[derive(Debug, Subcommand)]
pub enum AircraftCommand {
    /// Register the aircraft
    Register(AircraftRegister),

    /// Show the registered aircraft
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Aircraft registration arguments.
#[derive(Debug, Args)]
pub struct AircraftRegister {
    /// Aircraft name
    #[arg(long)]
    pub name: String,

    /// Registration code
    #[arg(long)]
    pub code: String,

    /// Manufacturer part number
    #[arg(long)]
    pub part_num: Option<String>,

    /// Manufacturer serial number
    #[arg(long)]
    pub serial_num: Option<String>,

    /// Motor as CODE=HH:MM (repeatable)
    #[arg(long = "motor", value_name = "CODE=HH:MM")]
    pub motors: Vec<String>,

    /// Main battery as CODE=CYCLES (repeatable)
    #[arg(long = "battery", value_name = "CODE=CYCLES")]
    pub batteries: Vec<String>,

    /// Spare battery as CODE=CYCLES (repeatable)
    #[arg(long = "spare-battery", value_name = "CODE=CYCLES")]
    pub spare_batteries: Vec<String>,

    /// Camera as CODE=DESCRIPTION (repeatable)
    #[arg(long = "camera", value_name = "CODE=DESCRIPTION")]
    pub cameras: Vec<String>,
}

impl AircraftRegister {
    /// The registration form these arguments describe.
    #[must_use]
    pub fn into_form(self) -> AircraftForm {
        let battery = |arg: &String| {
            let (code, cycles) = split_pair(arg);
            BatteryInput { code, cycles }
        };
        AircraftForm {
            name: self.name,
            code: self.code,
            part_num: self.part_num,
            serial_num: self.serial_num,
            motors: self
                .motors
                .iter()
                .map(|arg| {
                    let (code, usage) = split_pair(arg);
                    MotorInput { code, usage }
                })
                .collect(),
            batteries_main: self.batteries.iter().map(battery).collect(),
            batteries_spare: self.spare_batteries.iter().map(battery).collect(),
            cameras: self
                .cameras
                .iter()
                .map(|arg| {
                    let (code, description) = split_pair(arg);
                    CameraInput { code, description }
                })
                .collect(),
        }
    }
}

/// Owner commands.
#[derive(Debug, Subcommand)]
pub enum OwnerCommand {
    /// Register an owner
    Add {
        /// Person or company name
        #[arg(long)]
        name: String,
        /// Identity document type (CC or NIT)
        #[arg(long, default_value = "CC")]
        id_type: String,
        /// Identity document number
        #[arg(long)]
        id_num: String,
    },

    /// List registered owners
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

impl OwnerCommand {
    /// The registration form for `add`.
    #[must_use]
    pub fn form(&self) -> Option<OwnerForm> {
        match self {
            Self::Add {
                name,
                id_type,
                id_num,
            } => Some(OwnerForm {
                name: name.clone(),
                id_type: id_type.clone(),
                id_num: id_num.clone(),
            }),
            Self::List { .. } => None,
        }
    }
}

/// Pilot commands.
#[derive(Debug, Subcommand)]
pub enum PilotCommand {
    /// Register a pilot
    Add {
        /// Full name
        #[arg(long)]
        name: String,
        /// National id number
        #[arg(long)]
        cc: String,
        /// License number
        #[arg(long)]
        license_num: String,
        /// License category
        #[arg(long)]
        license_type: String,
        /// License expiry (YYYY-MM-DD)
        #[arg(long)]
        license_expiry: String,
    },

    /// List registered pilots
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

impl PilotCommand {
    /// The registration form for `add`.
    #[must_use]
    pub fn form(&self) -> Option<PilotForm> {
        match self {
            Self::Add {
                name,
                cc,
                license_num,
                license_type,
                license_expiry,
            } => Some(PilotForm {
                name: name.clone(),
                cc: cc.clone(),
                license_num: license_num.clone(),
                license_type: license_type.clone(),
                license_expiry: license_expiry.clone(),
            }),
            Self::List { .. } => None,
        }
    }
}

/// Flight type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlightTypeArg {
    /// Operational flight
    Operational,
    /// Test flight
    Test,
}

impl From<FlightTypeArg> for FlightType {
    fn from(arg: FlightTypeArg) -> Self {
        match arg {
            FlightTypeArg::Operational => Self::Operational,
            FlightTypeArg::Test => Self::Test,
        }
    }
}

/// Flight phase argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseArg {
    /// Ascenso
    Ascent,
    /// Descenso
    Descent,
    /// Desplazamiento
    Cruise,
    /// Ascenso+Desp
    AscentCruise,
    /// Descenso+Desp
    DescentCruise,
    /// Hover
    Hover,
}

impl From<PhaseArg> for PhaseName {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Ascent => Self::Ascent,
            PhaseArg::Descent => Self::Descent,
            PhaseArg::Cruise => Self::Cruise,
            PhaseArg::AscentCruise => Self::AscentCruise,
            PhaseArg::DescentCruise => Self::DescentCruise,
            PhaseArg::Hover => Self::Hover,
        }
    }
}

/// Flight lifecycle commands.
#[derive(Debug, Subcommand)]
pub enum FlightCommand {
    /// Submit the pre-flight form and schedule a flight
    Schedule(ScheduleArgs),

    /// Start the flight timer
    Start {
        /// Flight id
        id: i64,
        /// Declare a payload of this weight in kg
        #[arg(long, value_name = "KG")]
        payload: Option<String>,
    },

    /// Record the payload release
    Release {
        /// Flight id
        id: i64,
    },

    /// Enter a phase (test flights only)
    Phase {
        /// Flight id
        id: i64,
        /// Phase to enter
        #[arg(value_enum)]
        phase: PhaseArg,
    },

    /// Finish the flight and credit its usage
    Finish {
        /// Flight id
        id: i64,
    },

    /// Abort the flight
    Abort {
        /// Flight id
        id: i64,
        /// Reason printed on the report
        #[arg(long)]
        reason: Option<String>,
    },

    /// Show the timer view of a flight
    Resume {
        /// Flight id
        id: i64,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Follow the elapsed time of a flight in progress
    Watch {
        /// Flight id
        id: i64,
    },

    /// Show a flight record
    Show {
        /// Flight id
        id: i64,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Submit the post-flight form and write the report
    Close(CloseArgs),

    /// List recent flights
    List {
        /// Maximum number of flights
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Pre-flight form arguments.
#[derive(Debug, Args)]
pub struct ScheduleArgs {
    /// Flight type
    #[arg(short = 't', long = "type", value_enum)]
    pub flight_type: FlightTypeArg,

    /// Internal pilot id
    #[arg(long)]
    pub pilot_internal: i64,

    /// External pilot id
    #[arg(long)]
    pub pilot_external: i64,

    /// Mission leader id
    #[arg(long)]
    pub mission_leader: Option<i64>,

    /// Flight engineer id
    #[arg(long)]
    pub flight_engineer: Option<i64>,

    /// Battery id (repeatable)
    #[arg(long = "battery", required = true)]
    pub batteries: Vec<String>,

    /// Camera id
    #[arg(long)]
    pub camera: Option<String>,

    /// Purpose of the flight
    #[arg(long)]
    pub purpose: String,

    /// Estimated flight time in minutes
    #[arg(long)]
    pub estimated_time: String,

    /// Location or coordinates
    #[arg(long)]
    pub location: String,
}

impl ScheduleArgs {
    /// The pre-flight form these arguments describe.
    #[must_use]
    pub fn into_form(self) -> PreFlightForm {
        PreFlightForm {
            flight_type: self.flight_type.into(),
            crew: Crew {
                pilot_internal: self.pilot_internal,
                pilot_external: self.pilot_external,
                mission_leader: self.mission_leader,
                flight_engineer: self.flight_engineer,
            },
            batteries: self.batteries,
            camera: self.camera,
            purpose: self.purpose,
            estimated_time: self.estimated_time,
            location: self.location,
        }
    }
}

/// Post-flight form arguments.
#[derive(Debug, Args)]
pub struct CloseArgs {
    /// Flight id
    pub id: i64,

    /// Post-flight condition of the aircraft
    #[arg(long)]
    pub status: String,

    /// Notes
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Report file name, without extension
    #[arg(long)]
    pub report_name: String,

    /// Signature as ROLE=data:image/...;base64,... (repeatable)
    #[arg(long = "signature", value_name = "ROLE=DATA_URI")]
    pub signatures: Vec<String>,

    /// Signature read from a file as ROLE=PATH (repeatable)
    #[arg(long = "signature-file", value_name = "ROLE=PATH")]
    pub signature_files: Vec<String>,
}

impl CloseArgs {
    /// Inline signatures as role and value.
    #[must_use]
    pub fn inline_signatures(&self) -> Vec<(String, String)> {
        self.signatures.iter().map(|s| split_pair(s)).collect()
    }

    /// Signature files as role and path.
    #[must_use]
    pub fn signature_paths(&self) -> Vec<(String, PathBuf)> {
        self.signature_files
            .iter()
            .map(|s| {
                let (role, path) = split_pair(s);
                (role, PathBuf::from(path))
            })
            .collect()
    }
}

/// Report commands.
#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Write the report of a terminal flight again
    Regenerate {
        /// Flight id
        id: i64,
    },

    /// List terminal flights without a report
    Missing {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Write the flight book
    Book,
}

/// Logbook command arguments.
#[derive(Debug, Args)]
pub struct LogbookCommand {
    /// Only operational flights
    #[arg(long)]
    pub operational: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Checklist stage argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StageArg {
    /// Before leaving for the field
    Departure,
    /// Aircraft assembly
    Assembly,
    /// Power-on checks
    PreFlight,
    /// After landing
    PostFlight,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Departure => Self::Departure,
            StageArg::Assembly => Self::Assembly,
            StageArg::PreFlight => Self::PreFlight,
            StageArg::PostFlight => Self::PostFlight,
        }
    }
}

/// Checklist command arguments.
#[derive(Debug, Args)]
pub struct ChecklistCommand {
    /// Checklist stage
    #[arg(value_enum)]
    pub stage: StageArg,

    /// Flight the checklist belongs to
    #[arg(short, long)]
    pub flight: Option<i64>,

    /// Items checked so far, numbered from 1 (repeatable or comma separated)
    #[arg(long = "check", value_delimiter = ',')]
    pub checked: Vec<usize>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("M1=02:05"), ("M1".into(), "02:05".into()));
        assert_eq!(split_pair("B1"), ("B1".into(), String::new()));
        assert_eq!(
            split_pair("Internal Pilot=data:image/png;base64,AA=="),
            ("Internal Pilot".into(), "data:image/png;base64,AA==".into())
        );
    }

    #[test]
    fn test_aircraft_register_into_form() {
        let args = AircraftRegister {
            name: "Dragom".into(),
            code: "HK-001".into(),
            part_num: None,
            serial_num: Some("SN-9".into()),
            motors: vec!["M1=02:05".into(), "M2".into()],
            batteries: vec!["B1=12".into()],
            spare_batteries: vec!["S1".into()],
            cameras: vec!["C1=Zoom 30x".into()],
        };
        let form = args.into_form();
        assert_eq!(form.motors[0].code, "M1");
        assert_eq!(form.motors[0].usage, "02:05");
        assert_eq!(form.motors[1].usage, "");
        assert_eq!(form.batteries_main[0].cycles, "12");
        assert_eq!(form.batteries_spare[0].code, "S1");
        assert_eq!(form.cameras[0].description, "Zoom 30x");

        let aircraft = form.into_aircraft().unwrap();
        assert_eq!(aircraft.motors[0].usage_minutes, 125);
    }

    #[test]
    fn test_schedule_args_into_form() {
        let args = ScheduleArgs {
            flight_type: FlightTypeArg::Test,
            pilot_internal: 1,
            pilot_external: 2,
            mission_leader: None,
            flight_engineer: Some(3),
            batteries: vec!["B1".into()],
            camera: None,
            purpose: "p".into(),
            estimated_time: "5".into(),
            location: "l".into(),
        };
        let form = args.into_form();
        assert_eq!(form.flight_type, FlightType::Test);
        assert_eq!(form.crew.flight_engineer, Some(3));
        assert_eq!(
            form.crew.required_signatures(),
            vec!["Internal Pilot", "External Pilot", "Flight Engineer"]
        );
    }

    #[test]
    fn test_phase_arg_conversion() {
        assert_eq!(PhaseName::from(PhaseArg::AscentCruise), PhaseName::AscentCruise);
        assert_eq!(PhaseName::from(PhaseArg::Hover).as_str(), "Hover");
    }

    #[test]
    fn test_stage_arg_conversion() {
        assert_eq!(Stage::from(StageArg::PostFlight), Stage::PostFlight);
    }

    #[test]
    fn test_owner_and_pilot_forms() {
        let cmd = OwnerCommand::Add {
            name: "Dragom SAS".into(),
            id_type: "nit".into(),
            id_num: "900".into(),
        };
        assert!(cmd.form().unwrap().into_owner().is_ok());
        assert!(OwnerCommand::List { json: false }.form().is_none());

        let cmd = PilotCommand::Add {
            name: "Ana".into(),
            cc: "1".into(),
            license_num: "L".into(),
            license_type: "RPAS".into(),
            license_expiry: "2030-01-01".into(),
        };
        assert!(cmd.form().unwrap().into_pilot().is_ok());
    }

    #[test]
    fn test_close_args_signatures() {
        let args = CloseArgs {
            id: 1,
            status: "ok".into(),
            notes: String::new(),
            report_name: "Flight_1".into(),
            signatures: vec!["Internal Pilot=data:image/png;base64,AA==".into()],
            signature_files: vec!["External Pilot=/tmp/sig.txt".into()],
        };
        assert_eq!(args.inline_signatures()[0].0, "Internal Pilot");
        assert_eq!(
            args.signature_paths(),
            vec![("External Pilot".to_string(), PathBuf::from("/tmp/sig.txt"))]
        );
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}

//! Command-line interface for flightbook.
//!
//! This module provides the CLI structure for the `flightbook` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AircraftCommand, AircraftRegister, ChecklistCommand, CloseArgs, ConfigCommand, FlightCommand,
    FlightTypeArg, LogbookCommand, OwnerCommand, PhaseArg, PilotCommand, ReportCommand,
    ScheduleArgs, StageArg, StatusCommand,
};

/// flightbook - Flight records for a UAV operation
///
/// Times flights, credits motor and airframe usage, keeps the logbooks and
/// writes the signed flight reports.
#[derive(Debug, Parser)]
#[command(name = "flightbook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register or show the aircraft
    #[command(subcommand)]
    Aircraft(AircraftCommand),

    /// Register or list owners
    #[command(subcommand)]
    Owner(OwnerCommand),

    /// Register or list pilots
    #[command(subcommand)]
    Pilot(PilotCommand),

    /// Run the flight lifecycle
    #[command(subcommand)]
    Flight(FlightCommand),

    /// Manage flight reports
    #[command(subcommand)]
    Report(ReportCommand),

    /// List flights that have a report
    Logbook(LogbookCommand),

    /// Show a checklist
    Checklist(ChecklistCommand),

    /// Show the dashboard
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Whether the command reads or writes flights, and so needs the
    /// startup sweep to have run first.
    #[must_use]
    pub fn touches_flights(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn status() -> Command {
        Command::Status(StatusCommand { json: false })
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "flightbook");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let mut cli = Cli {
            config: None,
            verbose: 0,
            quiet: true,
            command: status(),
        };
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Quiet);

        cli.quiet = false;
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Normal);
        cli.verbose = 1;
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Verbose);
        cli.verbose = 2;
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::try_parse_from(["flightbook", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Status(StatusCommand { json: true })));
    }

    #[test]
    fn test_parse_with_config() {
        let cli =
            Cli::try_parse_from(["flightbook", "-c", "/custom/config.toml", "status"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_flight_start_with_payload() {
        let cli =
            Cli::try_parse_from(["flightbook", "flight", "start", "4", "--payload", "2.5"]).unwrap();
        match cli.command {
            Command::Flight(FlightCommand::Start { id, payload }) => {
                assert_eq!(id, 4);
                assert_eq!(payload.as_deref(), Some("2.5"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_flight_phase() {
        let cli = Cli::try_parse_from(["flightbook", "flight", "phase", "4", "ascent-cruise"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Flight(FlightCommand::Phase {
                id: 4,
                phase: PhaseArg::AscentCruise
            })
        ));
    }

    #[test]
    fn test_parse_schedule_requires_battery() {
        let base = [
            "flightbook",
            "flight",
            "schedule",
            "--type",
            "test",
            "--pilot-internal",
            "1",
            "--pilot-external",
            "2",
            "--purpose",
            "p",
            "--estimated-time",
            "5",
            "--location",
            "l",
        ];
        assert!(Cli::try_parse_from(base).is_err());

        let mut args = base.to_vec();
        args.extend(["--battery", "B1", "--battery", "B2"]);
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Flight(FlightCommand::Schedule(schedule)) => {
                assert_eq!(schedule.batteries, vec!["B1", "B2"]);
                assert_eq!(schedule.flight_type, FlightTypeArg::Test);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_checklist() {
        let cli = Cli::try_parse_from([
            "flightbook",
            "checklist",
            "post-flight",
            "--flight",
            "3",
            "--check",
            "1,2",
            "--check",
            "5",
        ])
        .unwrap();
        match cli.command {
            Command::Checklist(cmd) => {
                assert_eq!(cmd.stage, StageArg::PostFlight);
                assert_eq!(cmd.flight, Some(3));
                assert_eq!(cmd.checked, vec![1, 2, 5]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_logbook_operational() {
        let cli = Cli::try_parse_from(["flightbook", "logbook", "--operational"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Logbook(LogbookCommand {
                operational: true,
                json: false
            })
        ));
    }

    #[test]
    fn test_config_does_not_touch_flights() {
        let cli = Cli::try_parse_from(["flightbook", "config", "path"]).unwrap();
        assert!(!cli.command.touches_flights());
        assert!(status().touches_flights());
    }
}

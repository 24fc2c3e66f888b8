//! `flightbook` - CLI for UAV flight record keeping
//!
//! This binary provides the command-line interface for registering the
//! aircraft and crew, running the flight lifecycle and managing reports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{error, warn};

use flightbook::checklist::{Checklist, Next, Stage};
use flightbook::cli::{
    AircraftCommand, ChecklistCommand, CloseArgs, Cli, Command, ConfigCommand, FlightCommand,
    LogbookCommand, OwnerCommand, PilotCommand, ReportCommand,
};
use flightbook::forms::PostFlightForm;
use flightbook::lifecycle::{FlightTracker, SystemClock};
use flightbook::model::units::{format_duration_secs, format_stopwatch};
use flightbook::model::{format_timestamp, Flight, FlightType, Signatures};
use flightbook::report::ReportWriter;
use flightbook::state::AppState;
use flightbook::{init_logging, Config, Storage};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    let command = match cli.command {
        Command::Config(cmd) => return handle_config(&config, cmd),
        command => command,
    };

    let storage = Storage::open(config.database_path())
        .with_context(|| format!("opening {}", config.database_path().display()))?;
    let reports = ReportWriter::from_config(&config);
    let tracker = FlightTracker::new(&storage, &reports, Arc::new(SystemClock))
        .with_stale_after(config.stale_after());

    if command.touches_flights() {
        match tracker.startup_sweep_within(config.sweep_timeout()).await {
            Ok(sweep) if !sweep.is_empty() => {
                for id in &sweep.aborted {
                    eprintln!("Flight {id} was left in progress and has been aborted.");
                }
                for (id, reason) in &sweep.failed {
                    eprintln!("Flight {id} could not be aborted: {reason}");
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Startup sweep incomplete: {}", e),
        }
    }

    let result = match command {
        Command::Aircraft(cmd) => handle_aircraft(&storage, &config, cmd),
        Command::Owner(cmd) => handle_owner(&storage, &cmd),
        Command::Pilot(cmd) => handle_pilot(&storage, &cmd),
        Command::Flight(cmd) => handle_flight(&tracker, &storage, &config, cmd).await,
        Command::Report(cmd) => handle_report(&tracker, &storage, &reports, cmd).await,
        Command::Logbook(cmd) => handle_logbook(&storage, &cmd),
        Command::Checklist(cmd) => handle_checklist(&storage, &cmd),
        Command::Status(cmd) => handle_status(&storage, &config, cmd.json),
        Command::Config(_) => Ok(()),
    };

    result.map_err(|e| {
        error!("{}", e);
        anyhow!(e.user_message())
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> flightbook::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_flights(flights: &[Flight]) {
    if flights.is_empty() {
        println!("No flights.");
        return;
    }
    println!(
        "{:>5}  {:<10}  {:<10}  {:<19}  {:>9}  Report",
        "ID", "Type", "Status", "Date", "Duration"
    );
    for flight in flights {
        println!(
            "{:>5}  {:<10}  {:<10}  {:<19}  {:>9}  {}",
            flight.id.unwrap_or_default(),
            flight.flight_type,
            flight.status,
            flight.date.format("%Y-%m-%d %H:%M:%S"),
            format_duration_secs(flight.duration_secs),
            flight
                .report_path
                .as_ref()
                .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
        );
    }
}

fn handle_aircraft(
    storage: &Storage,
    config: &Config,
    cmd: AircraftCommand,
) -> flightbook::Result<()> {
    match cmd {
        AircraftCommand::Register(args) => {
            if let Some(existing) = storage.aircraft()? {
                return Err(flightbook::Error::validation(
                    "code",
                    format!("aircraft {} is already registered", existing.code),
                ));
            }
            let aircraft = args.into_form().into_aircraft()?;
            let id = storage.insert_aircraft(&aircraft)?;
            println!("Registered aircraft {} ({}) as #{id}", aircraft.name, aircraft.code);
        }
        AircraftCommand::Show { json } => {
            let Some(aircraft) = storage.aircraft()? else {
                return Err(flightbook::Error::AircraftNotRegistered);
            };
            if json {
                return print_json(&aircraft);
            }
            println!("{} ({})", aircraft.name, aircraft.code);
            if let Some(part) = &aircraft.part_num {
                println!("  Part number:  {part}");
            }
            if let Some(serial) = &aircraft.serial_num {
                println!("  Serial:       {serial}");
            }
            println!("  Total time:   {}", aircraft.total_time_display());
            for motor in &aircraft.motors {
                println!("  Motor {:<8} {}", motor.code, motor.usage_clock());
            }
            for battery in aircraft.batteries() {
                println!("  Battery {:<6} {} cycles", battery.code, battery.cycles);
            }
            for camera in &aircraft.cameras {
                println!("  Camera {:<7} {}", camera.code, camera.description);
            }
            for alert in aircraft.maintenance_alerts(config.maintenance.motor_limit_minutes) {
                println!("  ! {alert}");
            }
        }
    }
    Ok(())
}

fn handle_owner(storage: &Storage, cmd: &OwnerCommand) -> flightbook::Result<()> {
    if let Some(form) = cmd.form() {
        let owner = form.into_owner()?;
        let id = storage.insert_owner(&owner)?;
        println!("Registered owner {} as #{id}", owner.name);
        return Ok(());
    }
    let owners = storage.owners()?;
    if matches!(cmd, OwnerCommand::List { json: true }) {
        return print_json(&owners);
    }
    for owner in owners {
        println!(
            "{:>4}  {:<30}  {} {}",
            owner.id.unwrap_or_default(),
            owner.name,
            owner.id_type,
            owner.id_num
        );
    }
    Ok(())
}

fn handle_pilot(storage: &Storage, cmd: &PilotCommand) -> flightbook::Result<()> {
    if let Some(form) = cmd.form() {
        let pilot = form.into_pilot()?;
        let id = storage.insert_pilot(&pilot)?;
        println!("Registered pilot {} as #{id}", pilot.name);
        return Ok(());
    }
    let pilots = storage.pilots()?;
    if matches!(cmd, PilotCommand::List { json: true }) {
        return print_json(&pilots);
    }
    let now = chrono::Utc::now();
    for pilot in pilots {
        println!(
            "{:>4}  {:<30}  {:<12}  expires {}{}",
            pilot.id.unwrap_or_default(),
            pilot.name,
            pilot.license_num,
            pilot.license_expiry.format("%Y-%m-%d"),
            if pilot.is_license_valid_at(now) {
                ""
            } else {
                " (expired)"
            }
        );
    }
    Ok(())
}

async fn handle_flight(
    tracker: &FlightTracker<'_>,
    storage: &Storage,
    config: &Config,
    cmd: FlightCommand,
) -> flightbook::Result<()> {
    match cmd {
        FlightCommand::Schedule(args) => {
            let flight = tracker.schedule(args.into_form())?;
            println!(
                "Flight {} scheduled ({})",
                flight.id.unwrap_or_default(),
                flight.flight_type
            );
        }
        FlightCommand::Start { id, payload } => {
            let flight = tracker.start(id, payload.as_deref())?;
            if let Some(start) = flight.start_time {
                println!("Flight {id} started at {}", format_timestamp(start));
            }
        }
        FlightCommand::Release { id } => {
            let flight = tracker.release_payload(id)?;
            match flight.payload.as_ref().filter(|p| p.released) {
                Some(p) => println!(
                    "Payload released at +{}",
                    format_stopwatch(p.release_offset.unwrap_or_default())
                ),
                None => println!("Flight {id} carries no payload"),
            }
        }
        FlightCommand::Phase { id, phase } => {
            tracker.mark_phase(id, phase.into())?;
            println!("Flight {id}: phase {}", flightbook::model::PhaseName::from(phase));
        }
        FlightCommand::Finish { id } => {
            let finished = tracker.finish(id)?;
            println!(
                "Flight {id} finished after {}",
                format_stopwatch(finished.flight.duration_secs)
            );
            match finished.usage {
                Some(usage) => println!(
                    "Credited {} min; aircraft total {}",
                    usage.minutes,
                    flightbook::model::units::format_hours(usage.total_minutes)
                ),
                None => println!("No aircraft registered; usage not credited"),
            }
            println!("Submit the post-flight form with `flightbook flight close {id}`.");
        }
        FlightCommand::Abort { id, reason } => {
            let flight = tracker.abort(id, reason.as_deref()).await?;
            match &flight.report_path {
                Some(path) => println!("Flight {id} aborted; report {}", path.display()),
                None => println!(
                    "Flight {id} aborted; no report written (see `flightbook report missing`)"
                ),
            }
        }
        FlightCommand::Resume { id, json } => {
            let view = tracker.resume(id)?;
            if json {
                return print_json(&view);
            }
            println!("Flight {id}: {}", view.status);
            println!("  Elapsed:  {}", format_stopwatch(view.elapsed_secs));
            if view.payload.has_payload {
                println!(
                    "  Payload:  {} kg, {}",
                    view.payload.weight,
                    if view.payload.released {
                        "released"
                    } else {
                        "on board"
                    }
                );
            }
            for phase in &view.phases {
                println!(
                    "  Phase {:<15} {}",
                    phase.name,
                    phase
                        .duration
                        .map_or_else(|| "open".to_string(), |d| format!("{d:.1}s"))
                );
            }
        }
        FlightCommand::Watch { id } => {
            let view = tracker.resume(id)?;
            let Some(mut ticker) = view.ticker(tracker.clock(), config.tick_interval()) else {
                println!("Flight {id} is {}", view.status);
                return Ok(());
            };
            let mut rx = ticker.subscribe();
            println!("Watching flight {id}; Ctrl-C to stop");
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let elapsed = *rx.borrow_and_update();
                        println!("{}", format_stopwatch(elapsed));
                        tracker.keep_alive(id)?;
                        let status = storage.flight_status(id)?.unwrap_or(view.status);
                        if !ticker.observe(status) {
                            println!("Flight {id} is {status}");
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            ticker.stop();
        }
        FlightCommand::Show { id, json } => {
            let flight = storage
                .flight(id)?
                .ok_or(flightbook::Error::FlightNotFound(id))?;
            if json {
                return print_json(&flight);
            }
            print_flights(std::slice::from_ref(&flight));
        }
        FlightCommand::Close(args) => {
            let id = args.id;
            let form = post_flight_form(args)?;
            let flight = tracker.close_flight(id, form).await?;
            if let Some(path) = &flight.report_path {
                println!("Flight {id} closed; report {}", path.display());
            }
        }
        FlightCommand::List { limit, json } => {
            let flights = storage.flights(limit)?;
            if json {
                return print_json(&flights);
            }
            print_flights(&flights);
        }
    }
    Ok(())
}

fn post_flight_form(args: CloseArgs) -> flightbook::Result<PostFlightForm> {
    let mut signatures: Signatures = args.inline_signatures().into_iter().collect();
    for (role, path) in args.signature_paths() {
        let value = std::fs::read_to_string(&path)?;
        signatures.insert(role, value.trim().to_string());
    }
    Ok(PostFlightForm {
        status: args.status,
        notes: args.notes,
        report_name: args.report_name,
        signatures,
    })
}

async fn handle_report(
    tracker: &FlightTracker<'_>,
    storage: &Storage,
    reports: &ReportWriter,
    cmd: ReportCommand,
) -> flightbook::Result<()> {
    match cmd {
        ReportCommand::Regenerate { id } => {
            let path = tracker.regenerate_report(id).await?;
            println!("Report for flight {id} written to {}", path.display());
        }
        ReportCommand::Missing { json } => {
            let flights = storage.flights_missing_report()?;
            if json {
                return print_json(&flights);
            }
            print_flights(&flights);
        }
        ReportCommand::Book => {
            let flights = storage.flights(usize::MAX)?;
            let path = reports.write_flight_book(&flights).await?;
            println!("Flight book ({} flights) written to {}", flights.len(), path.display());
        }
    }
    Ok(())
}

fn handle_logbook(storage: &Storage, cmd: &LogbookCommand) -> flightbook::Result<()> {
    let filter = cmd.operational.then_some(FlightType::Operational);
    let flights = storage.reports(filter)?;
    if cmd.json {
        return print_json(&flights);
    }
    print_flights(&flights);
    Ok(())
}

fn handle_checklist(storage: &Storage, cmd: &ChecklistCommand) -> flightbook::Result<()> {
    let stage = Stage::from(cmd.stage);
    let mut checklist = match cmd.flight {
        Some(id) => {
            let flight = storage
                .flight(id)?
                .ok_or(flightbook::Error::FlightNotFound(id))?;
            Checklist::for_flight(stage, &flight)
        }
        None => Checklist::new(stage),
    };
    for n in &cmd.checked {
        checklist.check(n.saturating_sub(1))?;
    }

    println!("{stage} checklist");
    for (i, (item, checked)) in checklist.items().enumerate() {
        println!("  [{}] {:>2}. {item}", if checked { "x" } else { " " }, i + 1);
    }
    match checklist.advance() {
        Ok(Next::Stage(next)) => println!("Complete. Next: {next} checklist"),
        Ok(Next::PreFlightForm) => println!("Complete. Next: `flightbook flight schedule`"),
        Ok(Next::Dashboard) => println!("Complete."),
        Err(_) => println!("{} item(s) remaining", checklist.remaining()),
    }
    Ok(())
}

fn handle_status(storage: &Storage, config: &Config, json: bool) -> flightbook::Result<()> {
    let state = AppState::load(storage)?;
    let dashboard = state.dashboard(config.maintenance.motor_limit_minutes);
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "dashboard": dashboard,
            "storage": stats,
            "database_path": storage.path(),
            "reports_dir": config.reports_dir(),
        });
        return print_json(&status);
    }

    println!("flightbook status");
    println!("-----------------");
    match (&dashboard.aircraft_name, &dashboard.aircraft_code) {
        (Some(name), Some(code)) => println!("Aircraft:      {name} ({code})"),
        _ => println!("Aircraft:      not registered"),
    }
    if let Some(total) = &dashboard.total_time {
        println!("Total time:    {total}");
    }
    println!("Motors:        {}", dashboard.motor_count);
    println!("Pilots:        {}", dashboard.pilot_count);
    match dashboard.active_flight {
        Some(id) => println!("Active flight: {id}"),
        None => println!("Active flight: none"),
    }
    println!(
        "Flights:       {} ({} scheduled, {} completed, {} aborted)",
        stats.total_flights, stats.scheduled, stats.completed, stats.aborted
    );
    println!("Database:      {}", storage.path().display());
    for alert in &dashboard.alerts {
        println!("! {alert}");
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Reports]");
                println!("  Directory:          {}", config.reports_dir().display());
                println!("  Timeout (secs):     {}", config.reports.timeout_secs);
                println!();
                println!("[Lifecycle]");
                println!("  Tick interval (ms): {}", config.lifecycle.tick_interval_ms);
                println!("  Sweep timeout (s):  {}", config.lifecycle.sweep_timeout_secs);
                println!("  Stale after (s):    {}", config.lifecycle.stale_after_secs);
                println!();
                println!("[Maintenance]");
                println!(
                    "  Motor limit (min):  {}",
                    config.maintenance.motor_limit_minutes
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

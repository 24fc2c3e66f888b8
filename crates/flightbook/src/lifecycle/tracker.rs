//! The flight lifecycle tracker.
//!
//! Drives a flight from `Programado` through `EnCurso` to `Finalizado` or
//! `Abortado`. Every transition is checked against the stored status first
//! and written with a status guard, so a stale caller cannot move a flight
//! backwards or start two flights at once.
//!
//! An in-progress flight holds a timer lease that every lifecycle command
//! and the watcher renew. The startup sweep only aborts flights whose lease
//! has run out, so separate commands can carry a flight from start to
//! finish while a flight whose session died is still cleaned up.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::ticker::ElapsedTicker;
use super::usage::UsageUpdate;
use crate::error::{Error, Result};
use crate::forms::{validate_payload_weight, PostFlightForm, PreFlightForm};
use crate::model::{Flight, FlightStatus, FlightType, PayloadState, Phase, PhaseName};
use crate::report::{flight_report_name, FlightReport, ReportWriter};
use crate::storage::Storage;

/// Reason recorded on flights aborted by the startup sweep.
pub const SWEEP_REASON: &str = "FALLA";

/// Default time an in-progress flight may go untouched before it is stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(2 * 60 * 60);

/// Timer view of a flight, rebuilt from storage on resume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightView {
    /// Flight id.
    pub flight_id: i64,
    /// Lifecycle status.
    pub status: FlightStatus,
    /// Operational or test, if the row could be read.
    pub flight_type: Option<FlightType>,
    /// When the timer was started.
    pub start_time: Option<DateTime<Utc>>,
    /// Elapsed seconds at the time the view was built.
    pub elapsed_secs: i64,
    /// Payload state.
    pub payload: PayloadState,
    /// Phase log, as stored.
    pub phases: Vec<Phase>,
    /// Phase still open, if any.
    pub current_phase: Option<PhaseName>,
}

impl FlightView {
    /// View of a flight whose record could not be read.
    #[must_use]
    pub fn scheduled(flight_id: i64) -> Self {
        Self {
            flight_id,
            status: FlightStatus::Scheduled,
            flight_type: None,
            start_time: None,
            elapsed_secs: 0,
            payload: PayloadState::none(),
            phases: Vec::new(),
            current_phase: None,
        }
    }

    /// Build the view of `flight` as of `now`.
    #[must_use]
    pub fn from_flight(flight: &Flight, now: DateTime<Utc>) -> Self {
        let elapsed_secs = match flight.status {
            FlightStatus::InProgress => flight.elapsed_secs_at(now),
            FlightStatus::Completed => flight.duration_secs,
            FlightStatus::Scheduled | FlightStatus::Aborted => 0,
        };
        Self {
            flight_id: flight.id.unwrap_or_default(),
            status: flight.status,
            flight_type: Some(flight.flight_type),
            start_time: flight.start_time,
            elapsed_secs,
            payload: flight.payload.clone().unwrap_or_default(),
            phases: flight.phases.clone(),
            current_phase: flight.current_phase(),
        }
    }

    /// Start a ticker for this view if the flight is in progress.
    #[must_use]
    pub fn ticker(&self, clock: Arc<dyn Clock>, interval: Duration) -> Option<ElapsedTicker> {
        match (self.status, self.start_time) {
            (FlightStatus::InProgress, Some(start)) => Some(ElapsedTicker::spawn(
                self.flight_id,
                start,
                clock,
                interval,
            )),
            _ => None,
        }
    }
}

/// A finished flight and the usage it credited.
#[derive(Debug, Clone)]
pub struct Finished {
    /// The completed flight.
    pub flight: Flight,
    /// Usage added to the aircraft, if one is registered.
    pub usage: Option<UsageUpdate>,
}

/// Outcome of the startup sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Flights moved to `Abortado`.
    pub aborted: Vec<i64>,
    /// Aborted flights whose report could not be written.
    pub missing_reports: Vec<i64>,
    /// Flights that could not be aborted, with the reason.
    pub failed: Vec<(i64, String)>,
    /// In-progress flights whose lease is still current, left running.
    pub live: Vec<i64>,
}

impl SweepReport {
    /// Whether the sweep found nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aborted.is_empty() && self.failed.is_empty()
    }
}

/// Runs lifecycle operations against storage.
#[derive(Debug)]
pub struct FlightTracker<'a> {
    storage: &'a Storage,
    reports: &'a ReportWriter,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl<'a> FlightTracker<'a> {
    /// Create a tracker.
    #[must_use]
    pub fn new(storage: &'a Storage, reports: &'a ReportWriter, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            reports,
            clock,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    /// Set how long an in-progress flight may go untouched before the
    /// startup sweep treats it as abandoned.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// The clock timestamps are taken from.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn load(&self, id: i64) -> Result<Flight> {
        self.storage.flight(id)?.ok_or(Error::FlightNotFound(id))
    }

    fn expect_status(flight: &Flight, status: FlightStatus, action: &'static str) -> Result<i64> {
        let id = flight.require_id()?;
        if flight.status == status {
            Ok(id)
        } else {
            Err(Error::InvalidTransition {
                id,
                from: flight.status,
                action,
            })
        }
    }

    fn report_for(&self, flight: Flight) -> Result<FlightReport> {
        let aircraft = self.storage.aircraft()?;
        let pilots = self.storage.pilots()?;
        Ok(FlightReport::new(flight, aircraft, &pilots))
    }

    /// Renew the timer lease of an in-progress flight.
    ///
    /// Returns `false` if the flight is no longer in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn keep_alive(&self, id: i64) -> Result<bool> {
        self.storage.touch_flight(id, self.clock.now())
    }

    /// Last time anything vouched for an in-progress flight: its lease, or
    /// its start time for rows written before leases existed.
    fn last_seen(&self, id: i64) -> Result<Option<DateTime<Utc>>> {
        if let Some(lease) = self.storage.timer_lease(id)? {
            return Ok(Some(lease.last_seen));
        }
        Ok(self.storage.flight(id)?.and_then(|f| f.start_time))
    }

    fn is_stale(&self, last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_seen {
            // A lease from the future means the clock moved back; leave it.
            Some(seen) => (now - seen)
                .to_std()
                .is_ok_and(|idle| idle >= self.stale_after),
            None => true,
        }
    }

    /// Validate a pre-flight form and store the scheduled flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AircraftNotRegistered`] before any aircraft exists,
    /// a validation error for a bad form, or a storage error.
    pub fn schedule(&self, form: PreFlightForm) -> Result<Flight> {
        let aircraft = self
            .storage
            .aircraft()?
            .ok_or(Error::AircraftNotRegistered)?;
        let pilots = self.storage.pilots()?;
        let mut flight = form.into_flight(self.clock.now(), &pilots, &aircraft)?;
        let id = self.storage.insert_flight(&flight)?;
        flight.id = Some(id);
        info!("Flight {} scheduled ({})", id, flight.flight_type);
        Ok(flight)
    }

    /// Start the timer of a scheduled flight.
    ///
    /// `payload_weight` declares a payload; it must be a positive number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlightAlreadyActive`] if another flight is in
    /// progress, [`Error::InvalidTransition`] if this one is not scheduled,
    /// or a validation error for the weight.
    pub fn start(&self, id: i64, payload_weight: Option<&str>) -> Result<Flight> {
        let mut flight = self.load(id)?;
        Self::expect_status(&flight, FlightStatus::Scheduled, "start")?;
        if let Some(active) = self.storage.active_flight_id()? {
            return Err(Error::FlightAlreadyActive { active });
        }

        let payload = match payload_weight {
            Some(weight) => {
                validate_payload_weight(weight)?;
                PayloadState::with_weight(weight.trim())
            }
            None => PayloadState::none(),
        };

        let now = self.clock.now();
        if !self.storage.start_flight(id, now, &payload)? {
            // Lost a race with another writer; report what is there now.
            if let Some(active) = self.storage.active_flight_id()? {
                return Err(Error::FlightAlreadyActive { active });
            }
            let from = self
                .storage
                .flight_status(id)?
                .ok_or(Error::FlightNotFound(id))?;
            return Err(Error::InvalidTransition {
                id,
                from,
                action: "start",
            });
        }

        flight.status = FlightStatus::InProgress;
        flight.start_time = Some(now);
        flight.end_time = None;
        flight.payload = Some(payload);
        info!("Flight {} started", id);
        Ok(flight)
    }

    /// Record the payload release. Only the first call has an effect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if the flight is not in progress.
    pub fn release_payload(&self, id: i64) -> Result<Flight> {
        let mut flight = self.load(id)?;
        Self::expect_status(&flight, FlightStatus::InProgress, "release payload of")?;

        let now = self.clock.now();
        self.storage.touch_flight(id, now)?;
        let offset = flight.elapsed_secs_at(now);
        match flight.payload.as_mut() {
            Some(payload) if payload.has_payload && !payload.released => {
                payload.released = true;
                payload.release_time = Some(now);
                payload.release_offset = Some(offset);
                self.storage.save_payload(id, payload)?;
                info!("Flight {} released its payload at +{}s", id, offset);
            }
            _ => debug!("Flight {}: no payload to release", id),
        }
        Ok(flight)
    }

    /// Close the open phase and open `name`. Test flights only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if the flight is not in
    /// progress, or a validation error for an operational flight.
    pub fn mark_phase(&self, id: i64, name: PhaseName) -> Result<Flight> {
        let mut flight = self.load(id)?;
        Self::expect_status(&flight, FlightStatus::InProgress, "mark a phase on")?;
        if flight.flight_type != FlightType::Test {
            return Err(Error::validation(
                "phase",
                "Phases are only recorded on test flights",
            ));
        }

        let now = self.clock.now();
        self.storage.touch_flight(id, now)?;
        let now_ms = now.timestamp_millis();
        if let Some(open) = flight.phases.last_mut().filter(|p| p.is_open()) {
            open.end_time = Some(now_ms);
            #[allow(clippy::cast_precision_loss)]
            let secs = (now_ms - open.start_time) as f64 / 1000.0;
            open.duration = Some(secs);
        }
        flight.phases.push(Phase {
            name,
            start_time: now_ms,
            end_time: None,
            duration: None,
        });

        self.storage.save_phases(id, &flight.phases)?;
        debug!("Flight {} entered phase {}", id, name);
        Ok(flight)
    }

    /// Finish an in-progress flight and credit its usage.
    ///
    /// An open phase stays open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if the flight is not in progress.
    pub fn finish(&self, id: i64) -> Result<Finished> {
        let mut flight = self.load(id)?;
        Self::expect_status(&flight, FlightStatus::InProgress, "finish")?;
        let start = flight
            .start_time
            .ok_or_else(|| Error::internal(format!("flight {id} is in progress with no start time")))?;

        let end = self.clock.now();
        let duration = (end - start).num_seconds().max(0);
        let completion = self
            .storage
            .complete_flight(id, end, duration, &flight.phases)?;
        let Some(completion) = completion else {
            let from = self
                .storage
                .flight_status(id)?
                .ok_or(Error::FlightNotFound(id))?;
            return Err(Error::InvalidTransition {
                id,
                from,
                action: "finish",
            });
        };

        flight.status = FlightStatus::Completed;
        flight.end_time = Some(end);
        flight.duration_secs = duration;
        Ok(Finished {
            flight,
            usage: completion.usage,
        })
    }

    /// Abort a scheduled or in-progress flight and write its report.
    ///
    /// Aborting a terminal flight returns it unchanged. The status change is
    /// kept even if the report cannot be written; the flight is then left
    /// without a report path.
    ///
    /// # Errors
    ///
    /// Returns an error if the flight does not exist or storage fails.
    pub async fn abort(&self, id: i64, reason: Option<&str>) -> Result<Flight> {
        self.abort_at(id, reason, self.clock.now()).await
    }

    async fn abort_at(&self, id: i64, reason: Option<&str>, end: DateTime<Utc>) -> Result<Flight> {
        let mut flight = self.load(id)?;
        if flight.status.is_terminal() {
            debug!("Flight {} is already {}", id, flight.status);
            return Ok(flight);
        }

        let duration = flight.elapsed_secs_at(end);
        let end = flight.start_time.map_or(end, |start| end.max(start));
        if !self.storage.abort_flight(id, end, duration)? {
            return self.load(id);
        }
        flight.status = FlightStatus::Aborted;
        flight.end_time = Some(end);
        flight.duration_secs = duration;
        info!("Flight {} aborted", id);

        match self.write_aborted_report(&flight, reason).await {
            Ok(path) => flight.report_path = Some(path),
            Err(e) => warn!("Flight {} aborted without a report: {}", id, e),
        }
        Ok(flight)
    }

    async fn write_aborted_report(&self, flight: &Flight, reason: Option<&str>) -> Result<PathBuf> {
        let id = flight.require_id()?;
        let report = self.report_for(flight.clone())?;
        let path = self.reports.write_aborted_report(&report, reason).await?;
        self.storage.set_report_path(id, &path)?;
        Ok(path)
    }

    /// Rebuild the timer view of a flight.
    ///
    /// A row that cannot be decoded yields a scheduled view. Resuming an
    /// in-progress flight renews its lease.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FlightNotFound`] if no such flight exists.
    pub fn resume(&self, id: i64) -> Result<FlightView> {
        match self.storage.flight(id) {
            Ok(Some(flight)) => {
                let now = self.clock.now();
                if flight.status == FlightStatus::InProgress {
                    if let Err(e) = self.storage.touch_flight(id, now) {
                        warn!("Could not renew the lease of flight {}: {}", id, e);
                    }
                }
                Ok(FlightView::from_flight(&flight, now))
            }
            Ok(None) => Err(Error::FlightNotFound(id)),
            Err(e) => {
                warn!("Could not read flight {}: {}; showing it as scheduled", id, e);
                Ok(FlightView::scheduled(id))
            }
        }
    }

    /// Abort every in-progress flight whose lease has run out.
    ///
    /// A stale flight is closed at the last time its lease was renewed, so
    /// the time the program was not running is not counted as flight time.
    /// Failures are logged and the sweep moves on to the next flight.
    ///
    /// # Errors
    ///
    /// Returns an error only if the in-progress flights cannot be listed.
    pub async fn startup_sweep(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let now = self.clock.now();
        for id in self.storage.flight_ids_with_status(FlightStatus::InProgress)? {
            let last_seen = match self.last_seen(id) {
                Ok(seen) => seen,
                Err(e) => {
                    warn!("Startup sweep could not read flight {}: {}", id, e);
                    report.failed.push((id, e.user_message()));
                    continue;
                }
            };
            if !self.is_stale(last_seen, now) {
                debug!("Flight {} is still in progress", id);
                report.live.push(id);
                continue;
            }

            match self
                .abort_at(id, Some(SWEEP_REASON), last_seen.unwrap_or(now))
                .await
            {
                Ok(flight) => {
                    if flight.report_path.is_none() {
                        report.missing_reports.push(id);
                    }
                    report.aborted.push(id);
                }
                Err(e) => {
                    warn!("Startup sweep could not abort flight {}: {}", id, e);
                    report.failed.push((id, e.user_message()));
                }
            }
        }
        if !report.is_empty() {
            info!(
                "Startup sweep aborted {} flight(s), {} failed",
                report.aborted.len(),
                report.failed.len()
            );
        }
        Ok(report)
    }

    /// Run [`Self::startup_sweep`] bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the sweep does not finish in time.
    pub async fn startup_sweep_within(&self, timeout: Duration) -> Result<SweepReport> {
        tokio::time::timeout(timeout, self.startup_sweep())
            .await
            .map_err(|_| Error::Timeout {
                operation: "startup sweep".to_string(),
            })?
    }

    /// Submit the post-flight form of a completed flight.
    ///
    /// Writes the full report under the form's report name and stores the
    /// form, signatures and report path together.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the flight is completed,
    /// a validation error for the form, or a report error.
    pub async fn close_flight(&self, id: i64, form: PostFlightForm) -> Result<Flight> {
        let flight = self.load(id)?;
        Self::expect_status(&flight, FlightStatus::Completed, "close")?;
        let valid = form.validate(flight.crew.as_ref())?;

        let mut report = self.report_for(flight)?;
        report.flight.postflight = Some(valid.postflight.clone());
        report.flight.signatures = Some(valid.signatures.clone());
        let path = self
            .reports
            .write_flight_report(&report, &valid.report_name)
            .await?;

        self.storage
            .save_postflight(id, &valid.postflight, &valid.signatures, &path)?;
        let mut flight = report.flight;
        flight.report_path = Some(path);
        info!("Flight {} closed", id);
        Ok(flight)
    }

    /// Write the report of a terminal flight again and record its path.
    ///
    /// Completed flights keep their report name if one was recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] for a flight that is not
    /// terminal, or a report error.
    pub async fn regenerate_report(&self, id: i64) -> Result<PathBuf> {
        let flight = self.load(id)?;
        let path = match flight.status {
            FlightStatus::Completed => {
                let name = flight
                    .report_path
                    .as_deref()
                    .and_then(|p| p.file_stem())
                    .and_then(|s| s.to_str())
                    .map_or_else(|| flight_report_name(id), str::to_string);
                let report = self.report_for(flight)?;
                self.reports.write_flight_report(&report, &name).await?
            }
            FlightStatus::Aborted => {
                let report = self.report_for(flight)?;
                self.reports.write_aborted_report(&report, None).await?
            }
            from => {
                return Err(Error::InvalidTransition {
                    id,
                    from,
                    action: "regenerate the report of",
                })
            }
        };
        self.storage.set_report_path(id, &path)?;
        Ok(path)
    }
}

//! The elapsed-time ticker shown while a flight is in progress.
//!
//! A background task samples the clock on a fixed interval and publishes
//! whole elapsed seconds through a `watch` channel. The task is aborted on
//! [`ElapsedTicker::stop`], on drop, and when an observed status leaves
//! `EnCurso`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::clock::Clock;
use crate::model::FlightStatus;

/// Handle to a running elapsed-time ticker.
#[derive(Debug)]
pub struct ElapsedTicker {
    flight_id: i64,
    rx: watch::Receiver<i64>,
    task: Option<JoinHandle<()>>,
}

fn elapsed_since(start: DateTime<Utc>, clock: &dyn Clock) -> i64 {
    (clock.now() - start).num_seconds().max(0)
}

impl ElapsedTicker {
    /// Spawn a ticker for a flight that started at `start`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        flight_id: i64,
        start: DateTime<Utc>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(elapsed_since(start, clock.as_ref()));

        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                if tx.send(elapsed_since(start, clock.as_ref())).is_err() {
                    break;
                }
            }
        });

        debug!("Ticker started for flight {}", flight_id);
        Self {
            flight_id,
            rx,
            task: Some(task),
        }
    }

    /// Flight this ticker belongs to.
    #[must_use]
    pub fn flight_id(&self) -> i64 {
        self.flight_id
    }

    /// Last published elapsed seconds.
    #[must_use]
    pub fn elapsed(&self) -> i64 {
        *self.rx.borrow()
    }

    /// A receiver that is notified on every tick.
    ///
    /// `changed()` returns an error once the ticker has stopped.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.rx.clone()
    }

    /// Whether the ticker has not been stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop publishing. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Ticker stopped for flight {}", self.flight_id);
        }
    }

    /// Stop the ticker if the flight is no longer in progress.
    ///
    /// Returns whether the ticker is still running.
    pub fn observe(&mut self, status: FlightStatus) -> bool {
        if status != FlightStatus::InProgress {
            self.stop();
        }
        self.task.is_some()
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Flight lifecycle: status transitions, timing and usage accumulation.

pub mod clock;
pub mod ticker;
pub mod tracker;
pub mod usage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ticker::ElapsedTicker;
pub use tracker::{
    Finished, FlightTracker, FlightView, SweepReport, DEFAULT_STALE_AFTER, SWEEP_REASON,
};
pub use usage::UsageUpdate;

//! `dc-shift` — night and day shift engines for the distribution-center
//! simulator.
//!
//! # Night shift
//!
//! ```text
//! generate pallets ─► plan rounds ─► draw ad-hoc arrivals
//!   spawn: crew manager, one process per (truck, round), one per ad-hoc truck
//!   run until idle
//!   reduce: round summaries, stats, utilization, productivity, handoff
//! ```
//!
//! Rounds are chained by [`RoundGate`]s: round `r` trucks start only once
//! every round `r − 1` truck has finished picking.  Round 1 loads (yard,
//! checks, capacity fusion, crane loads); later rounds only stage pallets.
//!
//! # Day shift
//!
//! [`run_day_shift`] consumes a [`ShiftHandoffState`]: staged pallets are
//! checked through a shared queue and loaded as their trucks return.
//! [`run_full_cycle`] chains both shifts.
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`config`]    | `ShiftConfig`, crews, crew schedule, lunch, distributions |
//! | [`gate`]      | `RoundGate`, `RoundGates`, placement priority latch       |
//! | [`yard`]      | `Yard`, `YardPermit`, occupancy trace                     |
//! | [`pipeline`]  | truck round process, `select_for_capacity`, summaries     |
//! | [`adhoc`]     | ad-hoc arrivals and their checkpoint process              |
//! | [`crew`]      | crew manager process, capacity profiles                   |
//! | [`handoff`]   | `ShiftHandoffState`, `build_handoff`                      |
//! | [`night`]     | `run_shift`, `run_shift_with`                             |
//! | [`day`]       | `run_day_shift`                                           |
//! | [`cycle`]     | `run_full_cycle`                                          |
//! | [`replicate`] | `run_replications`, `ReplicationSummary`                  |
//! | [`observer`]  | `ShiftObserver`, `NoopObserver`                           |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs replications on Rayon's thread pool.              |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use dc_shift::{ShiftConfig, run_shift};
//!
//! let result = run_shift(20_000, 15_000, &ShiftConfig::default(), Some(42))?;
//! println!("overrun: {:.1} min", result.overrun);
//! ```

pub mod adhoc;
pub mod config;
pub mod crew;
pub mod cycle;
pub mod day;
pub mod error;
pub mod gate;
pub mod handoff;
pub mod night;
pub mod observer;
pub mod pipeline;
pub mod replicate;
pub mod result;
pub mod yard;

mod facility;
mod samplers;

#[cfg(test)]
mod tests;

pub use adhoc::{AdhocArrival, AdhocSummary};
pub use config::{
    AdhocConfig, BandedParams, CountRange, CrewChange, CrewOverride, CrewSizes, Distributions,
    LunchBreak, PRIORITY_HIGH, PRIORITY_LOW, ShiftConfig, TaskTimes,
};
pub use crew::crew_profiles;
pub use cycle::run_full_cycle;
pub use day::run_day_shift;
pub use error::{EngineResult, ShiftError};
pub use gate::{PlacementPriority, RoundGate, RoundGates};
pub use handoff::{PendingRound, ReturnSlot, ShiftHandoffState, StagedLoad, TruckEnRoute, build_handoff};
pub use night::{run_shift, run_shift_with};
pub use observer::{NoopObserver, ShiftObserver, replay};
pub use pipeline::{CapacityDetail, Fusion, LimitedBy, TruckSummary, select_for_capacity};
pub use replicate::{ReplicationSummary, run_replications};
pub use result::{
    CycleResult, DayLoad, DayShiftResult, Productivity, RoundSummary, ShiftInput, ShiftResult,
    TruckMovement,
};
pub use yard::{Yard, YardEvent, YardPermit};

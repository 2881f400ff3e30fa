//! `dc-core` — foundational types for the distribution-center shift simulator.
//!
//! This crate is a dependency of every other `dc-*` crate.  It has no `dc-*`
//! dependencies and minimal external ones (`rand`, `rand_distr` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `RoundNo`, `PalletId`, `PalletCategory`, `TruckId`        |
//! | [`time`]        | `SimTime`, `ShiftWindow`, clock labels                    |
//! | [`rng`]         | `ShiftRng` (one stream per shift, derivable children)     |
//! | [`sampling`]    | Calibrated duration / capacity / count distributions      |
//! | [`error`]       | `DcError`, `DcResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod rng;
pub mod sampling;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DcError, DcResult};
pub use ids::{PalletCategory, PalletId, RoundNo, TruckId};
pub use rng::ShiftRng;
pub use sampling::{
    BandedLogNormal, ChiSquaredParams, ChiSquaredPrep, LogNormalParams, ReturnTrip,
    ReturnTripParams, ShiftedLogNormal, ShiftedWeibull, TruncatedLogNormal,
    TruncatedLogNormalParams, UniformRange, WeibullParams,
};
pub use time::{ShiftWindow, SimTime, clock_label};

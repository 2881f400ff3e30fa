//! `dc-plan` — turns a shift's box totals into pallets and per-round truck
//! assignments.
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`pallet`]    | `Pallet`, `PalletMix`, `generate_pallets`, `PalletSummary`  |
//! | [`planner`]   | `PlannerConfig`, `FillBand`, `build_plan`                   |
//! | [`plan`]      | `ShiftPlan`, `RoundPlan`, `TruckAssignment`, `RoundMode`    |
//! | [`fleet`]     | `TruckRoster`, `IdentitySource`, `FleetReuse`               |
//!
//! Planning is pure: given the same pallets, configuration and RNG state the
//! plan is identical.

pub mod fleet;
pub mod pallet;
pub mod plan;
pub mod planner;


pub use fleet::{FleetReuse, IdentitySource, TruckRoster};
pub use pallet::{BoxRange, Pallet, PalletMix, PalletSummary, generate_pallets};
pub use plan::{RoundMode, RoundPlan, ShiftPlan, TruckAssignment};
pub use planner::{FillBand, PlannerConfig, build_plan};

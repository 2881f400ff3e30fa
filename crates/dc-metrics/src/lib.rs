//! `dc-metrics` — reduces operation logs into wait/hold aggregates and
//! utilization.
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`record`]      | `Station`, `OpLabel`, `OperationRecord`, `OperationLog` |
//! | [`stats`]       | `OpStats`, `StatsReport`                              |
//! | [`capacity`]    | `CapacityProfile` (step function of crew size)        |
//! | [`utilization`] | `utilization`, `Utilization`, `UtilizationReport`     |
//!
//! Nothing here touches the clock; every function is a pure reduction over
//! records that the shift engine has already appended.

pub mod capacity;
pub mod record;
pub mod stats;
pub mod utilization;


pub use capacity::CapacityProfile;
pub use record::{OpLabel, OperationLog, OperationRecord, Station};
pub use stats::{OpStats, StatsReport};
pub use utilization::{Utilization, UtilizationReport, utilization};

//! Shift observer trait for reporting and data collection.

use dc_metrics::OperationRecord;

use crate::adhoc::AdhocSummary;
use crate::pipeline::TruckSummary;
use crate::result::{RoundSummary, ShiftResult};

/// Callbacks invoked by [`run_shift_with`][crate::run_shift_with] once the
/// clock has stopped, in simulated order.
///
/// Processes cannot borrow the observer while suspended, so callbacks are
/// replayed from the finished logs: every operation in log order, then
/// every truck by end time, then every ad-hoc visit, then every round, and
/// finally the result itself.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — crane watcher
///
/// ```rust,ignore
/// struct CraneWait { total: f64 }
///
/// impl ShiftObserver for CraneWait {
///     fn on_operation(&mut self, record: &OperationRecord) {
///         if record.station() == Station::Crane {
///             self.total += record.wait;
///         }
///     }
/// }
/// ```
pub trait ShiftObserver {
    fn on_operation(&mut self, _record: &OperationRecord) {}

    fn on_truck(&mut self, _truck: &TruckSummary) {}

    fn on_adhoc(&mut self, _visit: &AdhocSummary) {}

    /// Called once per planned round, in round order.
    fn on_round(&mut self, _round: &RoundSummary) {}

    /// Called once after every other callback.
    fn on_shift_end(&mut self, _result: &ShiftResult) {}
}

/// A [`ShiftObserver`] that does nothing.
pub struct NoopObserver;

impl ShiftObserver for NoopObserver {}

/// Replay a finished shift into `observer`.
pub fn replay<O: ShiftObserver + ?Sized>(result: &ShiftResult, observer: &mut O) {
    for record in result.operations.iter() {
        observer.on_operation(record);
    }
    for truck in &result.trucks {
        observer.on_truck(truck);
    }
    for visit in &result.adhoc {
        observer.on_adhoc(visit);
    }
    for round in &result.rounds {
        observer.on_round(round);
    }
    observer.on_shift_end(result);
}

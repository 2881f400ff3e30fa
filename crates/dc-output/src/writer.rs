//! The `OutputWriter` trait implemented by all backend writers.

use crate::{OperationRow, OutputResult, RoundRow, TruckRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors are returned to the caller; [`ShiftOutputObserver`] stores the
/// first one for [`take_error`].
///
/// [`ShiftOutputObserver`]: crate::ShiftOutputObserver
/// [`take_error`]: crate::ShiftOutputObserver::take_error
pub trait OutputWriter {
    /// Write a batch of operation records.
    fn write_operations(&mut self, rows: &[OperationRow]) -> OutputResult<()>;

    fn write_truck(&mut self, row: &TruckRow) -> OutputResult<()>;

    fn write_round(&mut self, row: &RoundRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

//! `ShiftOutputObserver<W>` — bridges `ShiftObserver` to an `OutputWriter`.

use dc_metrics::OperationRecord;
use dc_shift::{RoundSummary, ShiftObserver, ShiftResult, TruckSummary};
use tracing::warn;

use crate::row::{OperationRow, RoundRow, TruckRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// Operations buffered before a batch write.
const OPERATION_BATCH: usize = 1024;

/// A [`ShiftObserver`] that writes operations, trucks and rounds to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `ShiftObserver`
/// methods have no return value.  After the run returns, check for errors
/// with [`take_error`][Self::take_error].
pub struct ShiftOutputObserver<W: OutputWriter> {
    writer:     W,
    pending:    Vec<OperationRow>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> ShiftOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pending:    Vec::with_capacity(OPERATION_BATCH),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after the run returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn flush_operations(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let result = self.writer.write_operations(&self.pending);
        self.pending.clear();
        self.store_err(result);
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            warn!(error = %e, "shift output write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> ShiftObserver for ShiftOutputObserver<W> {
    fn on_operation(&mut self, record: &OperationRecord) {
        self.pending.push(OperationRow::from(record));
        if self.pending.len() >= OPERATION_BATCH {
            self.flush_operations();
        }
    }

    fn on_truck(&mut self, truck: &TruckSummary) {
        self.flush_operations();
        let result = self.writer.write_truck(&TruckRow::from(truck));
        self.store_err(result);
    }

    fn on_round(&mut self, round: &RoundSummary) {
        let result = self.writer.write_round(&RoundRow::from(round));
        self.store_err(result);
    }

    fn on_shift_end(&mut self, _result: &ShiftResult) {
        self.flush_operations();
        let result = self.writer.finish();
        self.store_err(result);
    }
}

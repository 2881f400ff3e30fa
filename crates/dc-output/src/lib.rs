//! `dc-output` — result writers for the distribution-center shift simulator.
//!
//! | Feature   | Backend | Files created                                  |
//! |-----------|---------|------------------------------------------------|
//! | *(none)*  | CSV     | `operations.csv`, `trucks.csv`, `rounds.csv`   |
//! | `sqlite`  | SQLite  | `shift.db`                                     |
//!
//! Both backends implement [`OutputWriter`] and are driven by
//! [`ShiftOutputObserver`], which implements `dc_shift::ShiftObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dc_output::{CsvWriter, ShiftOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = ShiftOutputObserver::new(writer);
//! run_shift_with(20_000, 15_000, &cfg, Some(7), &mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::ShiftOutputObserver;
pub use row::{OperationRow, RoundRow, TruckRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

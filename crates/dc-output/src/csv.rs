//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `operations.csv`
//! - `trucks.csv`
//! - `rounds.csv`
//!
//! Absent optional values are written as empty fields.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OperationRow, OutputResult, RoundRow, TruckRow};

pub const OPERATION_HEADER: [&str; 10] =
    ["label", "station", "round", "truck", "pallet", "units", "wait", "hold", "start", "end"];

pub const TRUCK_HEADER: [&str; 15] = [
    "truck", "round", "source", "mode", "pallets_pre", "boxes_pre", "pallets_post", "boxes_post",
    "merged", "corrected", "start", "pick_end", "end", "limited_by", "return_trip",
];

pub const ROUND_HEADER: [&str; 12] = [
    "round", "mode", "trucks", "start", "pick_end", "operational_end", "pallets_pre", "boxes_pre",
    "pallets_post", "boxes_post", "merged", "corrected",
];

/// Writes shift output to three CSV files.
pub struct CsvWriter {
    operations: Writer<File>,
    trucks:     Writer<File>,
    rounds:     Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the three CSV files and write their
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut operations = Writer::from_path(dir.join("operations.csv"))?;
        operations.write_record(OPERATION_HEADER)?;

        let mut trucks = Writer::from_path(dir.join("trucks.csv"))?;
        trucks.write_record(TRUCK_HEADER)?;

        let mut rounds = Writer::from_path(dir.join("rounds.csv"))?;
        rounds.write_record(ROUND_HEADER)?;

        Ok(Self {
            operations,
            trucks,
            rounds,
            finished: false,
        })
    }
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

impl OutputWriter for CsvWriter {
    fn write_operations(&mut self, rows: &[OperationRow]) -> OutputResult<()> {
        for row in rows {
            self.operations.write_record(&[
                row.label.to_owned(),
                row.station.to_owned(),
                row.round.to_string(),
                row.truck.clone(),
                row.pallet.clone().unwrap_or_default(),
                row.units.to_string(),
                row.wait.to_string(),
                row.hold.to_string(),
                row.start.to_string(),
                row.end.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_truck(&mut self, row: &TruckRow) -> OutputResult<()> {
        self.trucks.write_record(&[
            row.truck.clone(),
            row.round.to_string(),
            row.source.to_owned(),
            row.mode.to_owned(),
            row.pallets_pre.to_string(),
            row.boxes_pre.to_string(),
            row.pallets_post.to_string(),
            row.boxes_post.to_string(),
            row.merged.to_string(),
            row.corrected.to_string(),
            row.start.to_string(),
            row.pick_end.to_string(),
            row.end.to_string(),
            opt(row.limited_by),
            opt(row.return_trip),
        ])?;
        Ok(())
    }

    fn write_round(&mut self, row: &RoundRow) -> OutputResult<()> {
        self.rounds.write_record(&[
            row.round.to_string(),
            row.mode.to_owned(),
            row.trucks.to_string(),
            row.start.to_string(),
            opt(row.pick_end),
            row.operational_end.to_string(),
            row.pallets_pre.to_string(),
            row.boxes_pre.to_string(),
            row.pallets_post.to_string(),
            row.boxes_post.to_string(),
            row.merged.to_string(),
            row.corrected.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.operations.flush()?;
        self.trucks.flush()?;
        self.rounds.flush()?;
        Ok(())
    }
}

//! Integration tests for dc-output.

use dc_core::{PalletCategory, PalletId, RoundNo, SimTime, TruckId};
use dc_metrics::{OpLabel, OperationRecord};

fn record(truck: &str, start: f64, end: f64) -> OperationRecord {
    OperationRecord::new(
        OpLabel::Check,
        RoundNo(1),
        TruckId::from(truck),
        SimTime(start - 1.0),
        SimTime(start),
        SimTime(end),
    )
    .with_pallet(PalletId::new(PalletCategory::Mixed, 12))
}

fn round_row(round: u32, pick_end: Option<f64>) -> crate::RoundRow {
    crate::RoundRow {
        round,
        mode:            if round == 1 { "loading" } else { "staging" },
        trucks:          3,
        start:           0.0,
        pick_end,
        operational_end: 90.0,
        pallets_pre:     12,
        boxes_pre:       600,
        pallets_post:    11,
        boxes_post:      600,
        merged:          1,
        corrected:       0,
    }
}

#[cfg(test)]
mod row_tests {
    use super::*;
    use crate::OperationRow;

    #[test]
    fn operation_row_flattens_record() {
        let row = OperationRow::from(&record("E44", 10.0, 12.5));
        assert_eq!(row.label, "check");
        assert_eq!(row.station, "checker");
        assert_eq!(row.round, 1);
        assert_eq!(row.truck, "E44");
        assert_eq!(row.pallet.as_deref(), Some("MX12"));
        assert_eq!(row.wait, 1.0);
        assert_eq!(row.hold, 2.5);
        assert_eq!(row.start, 10.0);
        assert_eq!(row.end, 12.5);
    }

    #[test]
    fn record_without_pallet_has_no_pallet_column() {
        let truck = TruckId::adhoc("T1", 3);
        let r = OperationRecord::new(OpLabel::GateIn, RoundNo::NONE, truck, SimTime(0.0), SimTime(0.0), SimTime(2.0));
        let row = OperationRow::from(&r);
        assert_eq!(row.station, "gate");
        assert_eq!(row.truck, "T1-0003");
        assert!(row.pallet.is_none());
    }
}

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use super::*;
    use crate::csv::{CsvWriter, OPERATION_HEADER, ROUND_HEADER, TRUCK_HEADER};
    use crate::row::OperationRow;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn headers(dir: &TempDir, file: &str) -> Vec<String> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.headers().unwrap().iter().map(str::to_owned).collect()
    }

    fn records(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("operations.csv").exists());
        assert!(dir.path().join("trucks.csv").exists());
        assert!(dir.path().join("rounds.csv").exists());
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = tmp();
        let nested = dir.path().join("night").join("run-1");
        let mut w = CsvWriter::new(&nested).unwrap();
        w.finish().unwrap();
        assert!(nested.join("operations.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        assert_eq!(headers(&dir, "operations.csv"), OPERATION_HEADER);
        assert_eq!(headers(&dir, "trucks.csv"), TRUCK_HEADER);
        assert_eq!(headers(&dir, "rounds.csv"), ROUND_HEADER);
    }

    #[test]
    fn operations_written_in_order() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let ops = [record("E44", 1.0, 2.0), record("E45", 2.0, 4.0), record("E46", 3.0, 3.5)];
        let rows: Vec<OperationRow> = ops.iter().map(OperationRow::from).collect();
        w.write_operations(&rows).unwrap();
        w.finish().unwrap();

        let read = records(&dir, "operations.csv");
        assert_eq!(read.len(), 3);
        assert_eq!(&read[0][0], "check");
        assert_eq!(&read[0][3], "E44");
        assert_eq!(&read[0][4], "MX12");
        assert_eq!(&read[1][3], "E45");
        assert_eq!(&read[2][9], "3.5"); // end
    }

    #[test]
    fn absent_pick_end_is_empty_field() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_round(&round_row(1, Some(42.0))).unwrap();
        w.write_round(&round_row(2, None)).unwrap();
        w.finish().unwrap();

        let read = records(&dir, "rounds.csv");
        assert_eq!(read.len(), 2);
        assert_eq!(&read[0][1], "loading");
        assert_eq!(&read[0][4], "42");
        assert_eq!(&read[1][1], "staging");
        assert_eq!(&read[1][4], "");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn csv_empty_batch_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_operations(&[]).unwrap();
    }
}

#[cfg(test)]
mod observer_tests {
    use tempfile::TempDir;

    use dc_shift::{ShiftConfig, run_shift_with};

    use crate::csv::CsvWriter;
    use crate::observer::ShiftOutputObserver;

    fn rows(dir: &TempDir, file: &str) -> usize {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records().map(|r| r.unwrap()).count()
    }

    #[test]
    fn integration_csv() {
        let mut cfg = ShiftConfig::default();
        cfg.adhoc.enabled = false;

        let dir = tempfile::tempdir().expect("create temp dir");
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = ShiftOutputObserver::new(writer);
        let result = run_shift_with(4_000, 3_000, &cfg, Some(11), &mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        assert_eq!(rows(&dir, "operations.csv"), result.operations.len());
        assert_eq!(rows(&dir, "trucks.csv"), result.trucks.len());
        assert_eq!(rows(&dir, "rounds.csv"), result.rounds.len());
    }

    #[test]
    fn truck_rows_follow_result_order() {
        let mut cfg = ShiftConfig::default();
        cfg.adhoc.enabled = false;

        let dir = tempfile::tempdir().expect("create temp dir");
        let mut obs = ShiftOutputObserver::new(CsvWriter::new(dir.path()).unwrap());
        let result = run_shift_with(4_000, 3_000, &cfg, Some(5), &mut obs).unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("trucks.csv")).unwrap();
        let trucks: Vec<String> = rdr.records().map(|r| r.unwrap()[0].to_owned()).collect();
        let expected: Vec<String> = result.trucks.iter().map(|t| t.truck.to_string()).collect();
        assert_eq!(trucks, expected);
    }
}

// ── SQLite tests ──────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use tempfile::TempDir;

    use super::*;
    use crate::row::OperationRow;
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("shift.db").exists());
    }

    #[test]
    fn sqlite_operation_count() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        let rows: Vec<OperationRow> =
            [record("E44", 1.0, 2.0), record("E45", 2.0, 3.0)].iter().map(OperationRow::from).collect();
        w.write_operations(&rows).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("shift.db")).unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM operations", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 2);
        let pallet: String =
            conn.query_row("SELECT pallet FROM operations WHERE truck = 'E45'", [], |r| r.get(0)).unwrap();
        assert_eq!(pallet, "MX12");
    }

    #[test]
    fn sqlite_null_pick_end() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_round(&round_row(3, None)).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("shift.db")).unwrap();
        let pick_end: Option<f64> =
            conn.query_row("SELECT pick_end FROM rounds WHERE round = 3", [], |r| r.get(0)).unwrap();
        assert_eq!(pick_end, None);
    }
}

//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `shift.db` file in the configured output directory with
//! three tables: `operations`, `trucks` and `rounds`.  Absent optional
//! values are stored as `NULL`; the `end` field is stored as `end_min`
//! because `END` is an SQL keyword.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{OperationRow, OutputResult, RoundRow, TruckRow};

/// Writes shift output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `shift.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("shift.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS operations (
                 label   TEXT    NOT NULL,
                 station TEXT    NOT NULL,
                 round   INTEGER NOT NULL,
                 truck   TEXT    NOT NULL,
                 pallet  TEXT,
                 units   INTEGER NOT NULL,
                 wait    REAL    NOT NULL,
                 hold    REAL    NOT NULL,
                 start   REAL    NOT NULL,
                 end_min REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS trucks (
                 truck        TEXT    NOT NULL,
                 round        INTEGER NOT NULL,
                 source       TEXT    NOT NULL,
                 mode         TEXT    NOT NULL,
                 pallets_pre  INTEGER NOT NULL,
                 boxes_pre    INTEGER NOT NULL,
                 pallets_post INTEGER NOT NULL,
                 boxes_post   INTEGER NOT NULL,
                 merged       INTEGER NOT NULL,
                 corrected    INTEGER NOT NULL,
                 start        REAL    NOT NULL,
                 pick_end     REAL    NOT NULL,
                 end_min      REAL    NOT NULL,
                 limited_by   TEXT,
                 return_trip  REAL,
                 PRIMARY KEY (truck, round)
             );
             CREATE TABLE IF NOT EXISTS rounds (
                 round           INTEGER PRIMARY KEY,
                 mode            TEXT    NOT NULL,
                 trucks          INTEGER NOT NULL,
                 start           REAL    NOT NULL,
                 pick_end        REAL,
                 operational_end REAL    NOT NULL,
                 pallets_pre     INTEGER NOT NULL,
                 boxes_pre       INTEGER NOT NULL,
                 pallets_post    INTEGER NOT NULL,
                 boxes_post      INTEGER NOT NULL,
                 merged          INTEGER NOT NULL,
                 corrected       INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_operations(&mut self, rows: &[OperationRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO operations \
                 (label, station, round, truck, pallet, units, wait, hold, start, end_min) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.label,
                    row.station,
                    row.round,
                    row.truck,
                    row.pallet,
                    row.units,
                    row.wait,
                    row.hold,
                    row.start,
                    row.end,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_truck(&mut self, row: &TruckRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO trucks \
             (truck, round, source, mode, pallets_pre, boxes_pre, pallets_post, boxes_post, \
              merged, corrected, start, pick_end, end_min, limited_by, return_trip) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                row.truck,
                row.round,
                row.source,
                row.mode,
                row.pallets_pre,
                row.boxes_pre,
                row.pallets_post,
                row.boxes_post,
                row.merged,
                row.corrected,
                row.start,
                row.pick_end,
                row.end,
                row.limited_by,
                row.return_trip,
            ],
        )?;
        Ok(())
    }

    fn write_round(&mut self, row: &RoundRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO rounds \
             (round, mode, trucks, start, pick_end, operational_end, pallets_pre, boxes_pre, \
              pallets_post, boxes_post, merged, corrected) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                row.round,
                row.mode,
                row.trucks,
                row.start,
                row.pick_end,
                row.operational_end,
                row.pallets_pre,
                row.boxes_pre,
                row.pallets_post,
                row.boxes_post,
                row.merged,
                row.corrected,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}

//! Wait/hold aggregates over operation records.

use std::collections::BTreeMap;

use dc_core::RoundNo;

use crate::{OpLabel, OperationRecord, Station};

/// Count, wait and hold totals for a group of operations.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpStats {
    pub count:      u64,
    pub total_wait: f64,
    pub max_wait:   f64,
    pub total_hold: f64,
}

impl OpStats {
    pub fn add(&mut self, record: &OperationRecord) {
        self.count += 1;
        self.total_wait += record.wait;
        self.max_wait = self.max_wait.max(record.wait);
        self.total_hold += record.hold;
    }

    pub fn of<'a>(records: impl IntoIterator<Item = &'a OperationRecord>) -> Self {
        let mut stats = Self::default();
        for r in records {
            stats.add(r);
        }
        stats
    }

    pub fn mean_wait(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.total_wait / self.count as f64 }
    }

    pub fn mean_hold(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.total_hold / self.count as f64 }
    }
}

/// Aggregates grouped three ways.  Maps are ordered so reports are stable.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsReport {
    pub overall:    OpStats,
    pub by_station: BTreeMap<Station, OpStats>,
    pub by_label:   BTreeMap<OpLabel, OpStats>,
    pub by_round:   BTreeMap<RoundNo, OpStats>,
}

impl StatsReport {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a OperationRecord>) -> Self {
        let mut report = Self::default();
        for r in records {
            report.overall.add(r);
            report.by_station.entry(r.station()).or_default().add(r);
            report.by_label.entry(r.label).or_default().add(r);
            report.by_round.entry(r.round).or_default().add(r);
        }
        report
    }

    pub fn station(&self, station: Station) -> OpStats {
        self.by_station.get(&station).copied().unwrap_or_default()
    }

    pub fn label(&self, label: OpLabel) -> OpStats {
        self.by_label.get(&label).copied().unwrap_or_default()
    }
}

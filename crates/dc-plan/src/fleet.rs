//! Truck identities.
//!
//! Identities are minted while building round 1 from a fixed roster of fleet
//! labels (then `E105`, `E106`, … once the roster runs out).  Later rounds
//! reuse round-1 identities in order; a later round with more trucks than
//! round 1 gets fresh labels for the surplus, flagged as such.

use std::collections::{BTreeMap, BTreeSet};

use dc_core::TruckId;

use crate::ShiftPlan;

const DEFAULT_ROSTER: [&str; 40] = [
    "E44", "E45", "E46", "E47", "E48", "E49", "E50", "E51", "E52", "E55",
    "E71", "E72", "E73", "E74", "E75", "E76", "E77", "E78", "E79", "E80",
    "E81", "E82", "E83", "E87", "E89", "E90", "E91", "E92", "E93", "E94",
    "E95", "E96", "E97", "E98", "E99", "E100", "E101", "E102", "E103", "E104",
];

/// Ordered list of fleet labels available to the planner.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TruckRoster {
    pub labels:         Vec<String>,
    /// Numeric suffix of the first label minted past the roster (`E{n}`).
    pub overflow_start: u32,
}

impl Default for TruckRoster {
    fn default() -> Self {
        Self {
            labels:         DEFAULT_ROSTER.iter().map(|s| (*s).to_owned()).collect(),
            overflow_start: 105,
        }
    }
}

impl TruckRoster {
    /// Label of the `idx`-th truck in minting order.
    pub fn label(&self, idx: usize) -> TruckId {
        match self.labels.get(idx) {
            Some(label) => TruckId::new(label.clone()),
            None => {
                let extra = (idx - self.labels.len()) as u32;
                TruckId::new(format!("E{}", self.overflow_start + extra))
            }
        }
    }
}

/// How an assignment got its truck identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdentitySource {
    /// Minted for round 1.
    Minted,
    /// A round-1 identity reused by a later round.
    Reused,
    /// Minted for a later round that needed more trucks than round 1 had.
    Surplus,
}

/// Identity for the `idx`-th truck of a round, given the round-1 fleet.
pub(crate) fn later_round_identity(
    idx:    usize,
    fleet:  &[TruckId],
    roster: &TruckRoster,
) -> (TruckId, IdentitySource) {
    match fleet.get(idx) {
        Some(id) => (id.clone(), IdentitySource::Reused),
        None => (roster.label(idx), IdentitySource::Surplus),
    }
}

/// How heavily the round-1 fleet is reused across the shift.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetReuse {
    pub round1_trucks:         usize,
    pub unique_trucks:         usize,
    /// Round-1 trucks that also serve a later round.
    pub reused_trucks:         usize,
    pub surplus_trucks:        usize,
    /// `reused_trucks / round1_trucks`, in percent.
    pub reuse_rate_pct:        f64,
    pub mean_rounds_per_truck: f64,
}

impl FleetReuse {
    pub fn of(plan: &ShiftPlan) -> Self {
        let mut rounds_per_truck: BTreeMap<&TruckId, usize> = BTreeMap::new();
        let mut surplus = BTreeSet::new();
        for a in plan.assignments() {
            *rounds_per_truck.entry(&a.truck).or_default() += 1;
            if a.source == IdentitySource::Surplus {
                surplus.insert(&a.truck);
            }
        }
        let round1 = plan.fleet();
        let reused = round1
            .iter()
            .filter(|id| rounds_per_truck.get(id).copied().unwrap_or(0) > 1)
            .count();
        let unique = rounds_per_truck.len();
        let total_rounds: usize = rounds_per_truck.values().sum();
        Self {
            round1_trucks:         round1.len(),
            unique_trucks:         unique,
            reused_trucks:         reused,
            surplus_trucks:        surplus.len(),
            reuse_rate_pct:        if round1.is_empty() { 0.0 } else { reused as f64 * 100.0 / round1.len() as f64 },
            mean_rounds_per_truck: if unique == 0 { 0.0 } else { total_rounds as f64 / unique as f64 },
        }
    }
}

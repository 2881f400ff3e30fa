//! Result records returned by the shift engines.

use std::collections::BTreeMap;

use dc_core::{RoundNo, SimTime, TruckId};
use dc_metrics::{OperationLog, OperationRecord, Station, StatsReport, UtilizationReport};
use dc_plan::{FleetReuse, PalletSummary, RoundMode, ShiftPlan};
use serde::{Deserialize, Serialize};

use crate::adhoc::AdhocSummary;
use crate::config::ShiftConfig;
use crate::gate::RoundGates;
use crate::handoff::ShiftHandoffState;
use crate::pipeline::TruckSummary;
use crate::yard::YardEvent;

/// The caller's inputs, echoed back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftInput {
    pub total_boxes:    u32,
    pub boxes_for_pick: u32,
    pub seed:           u64,
    pub config:         ShiftConfig,
}

/// Totals for one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round:           RoundNo,
    pub mode:            RoundMode,
    pub trucks:          u32,
    /// Pick completions the round's gate counted.
    pub pick_arrivals:   u32,
    /// Earliest gate release among the round's trucks.
    pub start:           SimTime,
    /// When the round's gate fired.
    pub pick_end:        Option<SimTime>,
    pub operational_end: SimTime,
    pub pallets_pre:     u32,
    pub boxes_pre:       u64,
    pub pallets_post:    u32,
    pub boxes_post:      u64,
    pub merged:          u32,
    pub corrected:       u32,
}

impl RoundSummary {
    /// One summary per gated round, in round order.  Rounds whose trucks
    /// never finished are reported with zero totals.
    pub(crate) fn collect(trucks: &[TruckSummary], gates: &RoundGates) -> Vec<Self> {
        let mut by_round: BTreeMap<RoundNo, Vec<&TruckSummary>> = BTreeMap::new();
        for t in trucks {
            by_round.entry(t.round).or_default().push(t);
        }
        gates
            .gates()
            .map(|gate| {
                let round = gate.round();
                let members = by_round.remove(&round).unwrap_or_default();
                let sum_u32 = |f: fn(&TruckSummary) -> u32| members.iter().map(|t| f(t)).sum::<u32>();
                let sum_u64 = |f: fn(&TruckSummary) -> u64| members.iter().map(|t| f(t)).sum::<u64>();
                RoundSummary {
                    round,
                    mode: RoundMode::of(round),
                    trucks: gate.target(),
                    pick_arrivals: gate.arrivals(),
                    start: members.iter().map(|t| t.start).min().unwrap_or_default(),
                    pick_end: gate.completion_time(),
                    operational_end: members.iter().map(|t| t.end).max().unwrap_or_default(),
                    pallets_pre: sum_u32(|t| t.pallets_pre),
                    boxes_pre: sum_u64(|t| t.boxes_pre),
                    pallets_post: sum_u32(|t| t.pallets_post),
                    boxes_post: sum_u64(|t| t.boxes_post),
                    merged: sum_u32(|t| t.merged),
                    corrected: sum_u32(|t| t.corrected),
                }
            })
            .collect()
    }
}

/// Mixed boxes picked per picker per effective hour.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Productivity {
    pub mixed_boxes:           u64,
    pub pickers:               u32,
    pub effective_hours:       f64,
    pub boxes_per_picker_hour: f64,
}

impl Productivity {
    pub fn new(mixed_boxes: u64, pickers: u32, effective_hours: f64) -> Self {
        let denom = f64::from(pickers) * effective_hours;
        let boxes_per_picker_hour = if denom > 0.0 { mixed_boxes as f64 / denom } else { 0.0 };
        Self { mixed_boxes, pickers, effective_hours, boxes_per_picker_hour }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftResult {
    pub input:        ShiftInput,
    pub pallets:      PalletSummary,
    pub plan:         ShiftPlan,
    pub rounds:       Vec<RoundSummary>,
    /// Ordered by end time, then round, then truck.
    pub trucks:       Vec<TruckSummary>,
    pub adhoc:        Vec<AdhocSummary>,
    pub operations:   OperationLog,
    pub stats:        StatsReport,
    pub utilization:  UtilizationReport,
    pub productivity: Productivity,
    pub fleet:        FleetReuse,
    pub yard_trace:   Vec<YardEvent>,
    pub nominal_end:  SimTime,
    /// Last instant any truck or operation finished.
    pub real_end:     SimTime,
    /// Minutes past the nominal end, never negative.
    pub overrun:      f64,
    pub handoff:      ShiftHandoffState,
}

impl ShiftResult {
    pub fn crane_log(&self) -> impl Iterator<Item = &OperationRecord> {
        self.operations.by_station(Station::Crane)
    }

    pub fn round(&self, round: RoundNo) -> Option<&RoundSummary> {
        self.rounds.iter().find(|r| r.round == round)
    }

    pub fn truck(&self, truck: &TruckId, round: RoundNo) -> Option<&TruckSummary> {
        self.trucks.iter().find(|t| &t.truck == truck && t.round == round)
    }
}

// ── Day shift ─────────────────────────────────────────────────────────────────

/// A truck leaving the dock or returning to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruckMovement {
    pub truck:   TruckId,
    /// Round loaded (departures) or delivered (returns).
    pub round:   RoundNo,
    /// Absolute minute of day.
    pub at_min:  f64,
    pub pallets: u32,
    pub boxes:   u64,
}

/// A staged lot loaded during the day shift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayLoad {
    pub truck:   TruckId,
    pub round:   RoundNo,
    pub pallets: u32,
    pub boxes:   u64,
    /// Truck available at the dock.
    pub ready:   SimTime,
    /// Every pallet of the lot checked.
    pub checked: SimTime,
    pub loaded:  SimTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayShiftResult {
    pub seed:            u64,
    pub config:          ShiftConfig,
    pub staged_pallets:  usize,
    pub pallets_checked: u32,
    pub loads:           Vec<DayLoad>,
    pub departures:      Vec<TruckMovement>,
    pub returns:         Vec<TruckMovement>,
    pub adhoc:           Vec<AdhocSummary>,
    pub operations:      OperationLog,
    pub stats:           StatsReport,
    pub utilization:     UtilizationReport,
    pub yard_trace:      Vec<YardEvent>,
    /// Lots still waiting when the shift closed.
    pub unfinished_lots: usize,
    pub end:             SimTime,
}

/// A night shift followed by the day shift that consumes its handoff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub night: ShiftResult,
    pub day:   DayShiftResult,
}

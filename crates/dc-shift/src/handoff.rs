//! End-of-shift snapshot handed to the next shift.
//!
//! All instants are absolute minutes of day so the receiving shift can map
//! them onto its own clock with [`ShiftWindow::relative`].  Nothing else
//! crosses a shift boundary.

use dc_core::{RoundNo, ShiftWindow, TruckId};
use dc_plan::{Pallet, RoundMode, ShiftPlan};
use serde::{Deserialize, Serialize};

use crate::pipeline::TruckSummary;

/// A loaded round-1 truck out on its route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruckEnRoute {
    pub truck:                TruckId,
    pub departed_at_min:      f64,
    pub boxes_loaded:         u64,
    pub pallets_loaded:       u32,
    pub estimated_return_min: Option<f64>,
}

/// Pallets staged for a later round, waiting to be checked and loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagedLoad {
    pub truck:        TruckId,
    pub origin_round: RoundNo,
    pub pallets:      Vec<Pallet>,
    pub boxes:        u64,
    pub ready_at_min: f64,
}

/// A round that still has to be loaded, with its trucks in plan order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingRound {
    pub round:  RoundNo,
    pub trucks: Vec<TruckId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnSlot {
    pub truck:      TruckId,
    pub eta_min:    f64,
    /// First staged round this truck is planned for, if any.
    pub next_round: Option<RoundNo>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftHandoffState {
    pub trucks_en_route:      Vec<TruckEnRoute>,
    pub staged_pallets_ready: Vec<StagedLoad>,
    pub pending_round_work:   Vec<PendingRound>,
    /// Ordered by estimated return.
    pub return_schedule:      Vec<ReturnSlot>,
}

impl ShiftHandoffState {
    pub fn staged_pallets(&self) -> usize {
        self.staged_pallets_ready.iter().map(|s| s.pallets.len()).sum()
    }

    pub fn staged_boxes(&self) -> u64 {
        self.staged_pallets_ready.iter().map(|s| s.boxes).sum()
    }

    /// Staged loads for `truck`, by origin round.
    pub fn loads_for<'a>(&'a self, truck: &'a TruckId) -> impl Iterator<Item = &'a StagedLoad> + 'a {
        self.staged_pallets_ready.iter().filter(move |s| &s.truck == truck)
    }

    pub fn en_route(&self, truck: &TruckId) -> Option<&TruckEnRoute> {
        self.trucks_en_route.iter().find(|t| &t.truck == truck)
    }
}

/// Build the handoff from the plan and the finished trucks.
pub fn build_handoff(plan: &ShiftPlan, trucks: &[TruckSummary], window: &ShiftWindow) -> ShiftHandoffState {
    let mut trucks_en_route = Vec::new();
    let mut staged_pallets_ready = Vec::new();
    for t in trucks {
        match t.mode {
            RoundMode::Loading => {
                let departed_at_min = window.absolute(t.end);
                trucks_en_route.push(TruckEnRoute {
                    truck: t.truck.clone(),
                    departed_at_min,
                    boxes_loaded: t.boxes_post,
                    pallets_loaded: t.pallets_post,
                    estimated_return_min: t.return_trip.map(|trip| departed_at_min + trip),
                });
            }
            RoundMode::Staging => staged_pallets_ready.push(StagedLoad {
                truck:        t.truck.clone(),
                origin_round: t.round,
                pallets:      t.pallets.clone(),
                boxes:        t.boxes_post,
                ready_at_min: window.absolute(t.end),
            }),
        }
    }
    trucks_en_route.sort_by(|a, b| a.departed_at_min.total_cmp(&b.departed_at_min).then_with(|| a.truck.cmp(&b.truck)));
    staged_pallets_ready.sort_by(|a, b| a.origin_round.cmp(&b.origin_round).then_with(|| a.truck.cmp(&b.truck)));

    let pending_round_work: Vec<PendingRound> = plan
        .rounds
        .iter()
        .filter(|r| r.mode() == RoundMode::Staging && !r.trucks.is_empty())
        .map(|r| PendingRound { round: r.round, trucks: r.trucks.iter().map(|a| a.truck.clone()).collect() })
        .collect();

    let mut return_schedule: Vec<ReturnSlot> = trucks_en_route
        .iter()
        .filter_map(|t| {
            let eta_min = t.estimated_return_min?;
            let next_round = pending_round_work
                .iter()
                .find(|p| p.trucks.contains(&t.truck))
                .map(|p| p.round);
            Some(ReturnSlot { truck: t.truck.clone(), eta_min, next_round })
        })
        .collect();
    return_schedule.sort_by(|a, b| a.eta_min.total_cmp(&b.eta_min).then_with(|| a.truck.cmp(&b.truck)));

    ShiftHandoffState { trucks_en_route, staged_pallets_ready, pending_round_work, return_schedule }
}

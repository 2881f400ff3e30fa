//! Plan types produced by [`build_plan`](crate::build_plan).

use dc_core::{RoundNo, TruckId};

use crate::{IdentitySource, Pallet};

/// What a round's trucks do once picking is done.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundMode {
    /// Round 1: yard, placement, checking, loading, close-out.
    Loading,
    /// Later rounds: pallets are only staged for a later shift.
    Staging,
}

impl RoundMode {
    pub fn of(round: RoundNo) -> Self {
        if round.0 <= 1 { RoundMode::Loading } else { RoundMode::Staging }
    }
}

/// One truck's work for one round.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TruckAssignment {
    pub truck:             TruckId,
    pub source:            IdentitySource,
    pub round:             RoundNo,
    pub pallets:           Vec<Pallet>,
    /// Box capacity drawn while packing this truck.
    pub planning_capacity: u32,
}

impl TruckAssignment {
    pub fn mode(&self) -> RoundMode {
        RoundMode::of(self.round)
    }

    pub fn boxes(&self) -> u32 {
        self.pallets.iter().map(|p| p.boxes).sum()
    }

    pub fn mixed(&self) -> impl Iterator<Item = &Pallet> {
        self.pallets.iter().filter(|p| p.is_mixed())
    }

    pub fn mixed_count(&self) -> usize {
        self.mixed().count()
    }

    pub fn mixed_boxes(&self) -> u32 {
        self.mixed().map(|p| p.boxes).sum()
    }

    pub fn complete_count(&self) -> usize {
        self.pallets.len() - self.mixed_count()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundPlan {
    pub round:  RoundNo,
    pub trucks: Vec<TruckAssignment>,
}

impl RoundPlan {
    pub fn mode(&self) -> RoundMode {
        RoundMode::of(self.round)
    }

    pub fn pallet_count(&self) -> usize {
        self.trucks.iter().map(|t| t.pallets.len()).sum()
    }

    pub fn boxes(&self) -> u64 {
        self.trucks.iter().map(|t| u64::from(t.boxes())).sum()
    }
}

/// The whole shift's assignments, rounds in ascending order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftPlan {
    pub rounds:     Vec<RoundPlan>,
    /// Pallets left over when the round cap was hit.
    pub unassigned: Vec<Pallet>,
}

impl ShiftPlan {
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn round(&self, round: RoundNo) -> Option<&RoundPlan> {
        self.rounds.iter().find(|r| r.round == round)
    }

    pub fn last_round(&self) -> RoundNo {
        self.rounds.last().map_or(RoundNo::NONE, |r| r.round)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &TruckAssignment> {
        self.rounds.iter().flat_map(|r| r.trucks.iter())
    }

    /// Identities minted for round 1, in minting order.
    pub fn fleet(&self) -> Vec<TruckId> {
        self.round(RoundNo::FIRST)
            .map(|r| r.trucks.iter().map(|t| t.truck.clone()).collect())
            .unwrap_or_default()
    }

    pub fn planned_boxes(&self) -> u64 {
        self.rounds.iter().map(RoundPlan::boxes).sum()
    }

    pub fn planned_pallets(&self) -> usize {
        self.rounds.iter().map(RoundPlan::pallet_count).sum()
    }
}

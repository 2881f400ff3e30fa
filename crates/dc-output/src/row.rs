//! Flat row types written by every backend.
//!
//! Times are minutes since the shift start; identifiers are rendered with
//! their `Display` form (`E44`, `MX12`).

use dc_metrics::OperationRecord;
use dc_plan::{IdentitySource, RoundMode};
use dc_shift::{LimitedBy, RoundSummary, TruckSummary};

/// One row per resource operation.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationRow {
    pub label:   &'static str,
    pub station: &'static str,
    pub round:   u32,
    pub truck:   String,
    pub pallet:  Option<String>,
    pub units:   u32,
    pub wait:    f64,
    pub hold:    f64,
    pub start:   f64,
    pub end:     f64,
}

impl From<&OperationRecord> for OperationRow {
    fn from(r: &OperationRecord) -> Self {
        Self {
            label:   r.label.as_str(),
            station: r.station().as_str(),
            round:   r.round.0,
            truck:   r.truck.to_string(),
            pallet:  r.pallet.map(|p| p.to_string()),
            units:   r.units,
            wait:    r.wait,
            hold:    r.hold,
            start:   r.start.minutes(),
            end:     r.end.minutes(),
        }
    }
}

/// One row per (truck, round).
#[derive(Clone, Debug, PartialEq)]
pub struct TruckRow {
    pub truck:        String,
    pub round:        u32,
    pub source:       &'static str,
    pub mode:         &'static str,
    pub pallets_pre:  u32,
    pub boxes_pre:    u64,
    pub pallets_post: u32,
    pub boxes_post:   u64,
    pub merged:       u32,
    pub corrected:    u32,
    pub start:        f64,
    pub pick_end:     f64,
    pub end:          f64,
    /// Loading trucks only.
    pub limited_by:   Option<&'static str>,
    pub return_trip:  Option<f64>,
}

impl From<&TruckSummary> for TruckRow {
    fn from(t: &TruckSummary) -> Self {
        Self {
            truck:        t.truck.to_string(),
            round:        t.round.0,
            source:       source_str(t.source),
            mode:         mode_str(t.mode),
            pallets_pre:  t.pallets_pre,
            boxes_pre:    t.boxes_pre,
            pallets_post: t.pallets_post,
            boxes_post:   t.boxes_post,
            merged:       t.merged,
            corrected:    t.corrected,
            start:        t.start.minutes(),
            pick_end:     t.pick_end.minutes(),
            end:          t.end.minutes(),
            limited_by:   t.capacity.as_ref().map(|c| limited_str(c.limited_by)),
            return_trip:  t.return_trip,
        }
    }
}

/// One row per planned round.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundRow {
    pub round:           u32,
    pub mode:            &'static str,
    pub trucks:          u32,
    pub start:           f64,
    pub pick_end:        Option<f64>,
    pub operational_end: f64,
    pub pallets_pre:     u32,
    pub boxes_pre:       u64,
    pub pallets_post:    u32,
    pub boxes_post:      u64,
    pub merged:          u32,
    pub corrected:       u32,
}

impl From<&RoundSummary> for RoundRow {
    fn from(r: &RoundSummary) -> Self {
        Self {
            round:           r.round.0,
            mode:            mode_str(r.mode),
            trucks:          r.trucks,
            start:           r.start.minutes(),
            pick_end:        r.pick_end.map(|t| t.minutes()),
            operational_end: r.operational_end.minutes(),
            pallets_pre:     r.pallets_pre,
            boxes_pre:       r.boxes_pre,
            pallets_post:    r.pallets_post,
            boxes_post:      r.boxes_post,
            merged:          r.merged,
            corrected:       r.corrected,
        }
    }
}

fn mode_str(mode: RoundMode) -> &'static str {
    match mode {
        RoundMode::Loading => "loading",
        RoundMode::Staging => "staging",
    }
}

fn source_str(source: IdentitySource) -> &'static str {
    match source {
        IdentitySource::Minted  => "minted",
        IdentitySource::Reused  => "reused",
        IdentitySource::Surplus => "surplus",
    }
}

fn limited_str(limit: LimitedBy) -> &'static str {
    match limit {
        LimitedBy::None    => "none",
        LimitedBy::Boxes   => "boxes",
        LimitedBy::Pallets => "pallets",
    }
}

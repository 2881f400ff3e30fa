//! The per-truck, per-round process.
//!
//! ```text
//!   wait gate(r−1) ─► pick mixed pallets ─► arrive gate(r) ─┬─ r = 1: loading
//!                                                           └─ r ≥ 2: staging
//!
//!   loading: yard unit ─► dispatch/placement per pallet ─► parallel checks
//!            ─► corrections + rechecks ─► capacity fusion ─► load kept pallets
//!            ─► rack adjust ─► move ─► release yard unit
//!
//!   staging: stage every pallet on the crane at low priority
//! ```

use std::rc::Rc;

use dc_core::{RoundNo, SimTime, TruckId};
use dc_des::DEFAULT_PRIORITY;
use dc_metrics::OpLabel;
use dc_plan::{IdentitySource, Pallet, RoundMode, TruckAssignment};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{PRIORITY_HIGH, PRIORITY_LOW};
use crate::facility::{Facility, Op};
use crate::gate::RoundGates;

// ── Capacity fusion ───────────────────────────────────────────────────────────

/// Which limit stopped a truck from taking every assigned pallet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitedBy {
    None,
    Boxes,
    Pallets,
}

/// Outcome of fitting a truck's pallets to its sampled capacity.
#[derive(Clone, Debug, PartialEq)]
pub struct Fusion {
    /// Pallets to load, largest first.
    pub kept:       Vec<Pallet>,
    /// Pallets merged out of this truck's load.
    pub merged:     Vec<Pallet>,
    /// The first limit a pallet ran into.
    pub limited_by: LimitedBy,
}

/// Keep pallets by descending box count while both limits hold.  A pallet
/// that does not fit is merged out and the scan moves on, so a smaller
/// pallet later in the order can still be kept.
pub fn select_for_capacity(pallets: &[Pallet], max_boxes: u32, max_pallets: u32) -> Fusion {
    let mut order: Vec<&Pallet> = pallets.iter().collect();
    order.sort_by(|a, b| b.boxes.cmp(&a.boxes));

    let mut kept = Vec::with_capacity(order.len());
    let mut merged = Vec::new();
    let mut boxes: u64 = 0;
    let mut limited_by = LimitedBy::None;
    for p in order {
        let room_for_pallet = (kept.len() as u64) < u64::from(max_pallets);
        let room_for_boxes = boxes + u64::from(p.boxes) <= u64::from(max_boxes);
        if room_for_pallet && room_for_boxes {
            boxes += u64::from(p.boxes);
            kept.push(*p);
        } else {
            if limited_by == LimitedBy::None {
                limited_by = if room_for_pallet { LimitedBy::Boxes } else { LimitedBy::Pallets };
            }
            merged.push(*p);
        }
    }
    Fusion { kept, merged, limited_by }
}

// ── Summaries ─────────────────────────────────────────────────────────────────

/// Sampled capacities and check-phase timing of a loading truck.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityDetail {
    pub box_capacity:        u32,
    pub pallet_capacity:     u32,
    pub limited_by:          LimitedBy,
    /// From the first check request until the last recheck finished.
    pub check_phase_minutes: f64,
    /// Total minutes pallets waited for a checker.
    pub check_wait:          f64,
    pub checked_pallets:     u32,
}

/// One truck's pass through one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TruckSummary {
    pub truck:         TruckId,
    pub round:         RoundNo,
    pub source:        IdentitySource,
    pub mode:          RoundMode,
    pub pallets_pre:   u32,
    pub boxes_pre:     u64,
    pub pallets_post:  u32,
    pub boxes_post:    u64,
    pub mixed_pallets: u32,
    pub mixed_boxes:   u64,
    pub merged:        u32,
    pub corrected:     u32,
    /// Gate passed; the truck may start using resources.
    pub start:         SimTime,
    pub pick_end:      SimTime,
    pub end:           SimTime,
    /// Loading trucks only.
    pub capacity:      Option<CapacityDetail>,
    /// Sampled round trip of a loading truck, in minutes.
    pub return_trip:   Option<f64>,
    /// Pallets on the truck (loaded) or staged for it, in handling order.
    pub pallets:       Vec<Pallet>,
}

impl TruckSummary {
    fn new(a: &TruckAssignment, start: SimTime, pick_end: SimTime) -> Self {
        Self {
            truck:         a.truck.clone(),
            round:         a.round,
            source:        a.source,
            mode:          a.mode(),
            pallets_pre:   a.pallets.len() as u32,
            boxes_pre:     u64::from(a.boxes()),
            pallets_post:  a.pallets.len() as u32,
            boxes_post:    u64::from(a.boxes()),
            mixed_pallets: a.mixed_count() as u32,
            mixed_boxes:   u64::from(a.mixed_boxes()),
            merged:        0,
            corrected:     0,
            start,
            pick_end,
            end:           pick_end,
            capacity:      None,
            return_trip:   None,
            pallets:       a.pallets.clone(),
        }
    }
}

// ── Process ───────────────────────────────────────────────────────────────────

pub(crate) async fn truck_round(fac: Rc<Facility>, gates: Rc<RoundGates>, assignment: TruckAssignment) {
    let env = fac.env.clone();
    let round = assignment.round;
    let truck = assignment.truck.clone();

    gates.wait(round.previous()).await;
    let start = env.now();
    debug!(truck = %truck, round = %round, t = start.minutes(), "truck released by gate");

    for pallet in assignment.mixed() {
        let op = Op::new(OpLabel::Pick, round, &truck).pallet(pallet.id);
        fac.perform(op, DEFAULT_PRIORITY, &fac.samplers.pick_prep).await;
    }
    let pick_end = env.now();
    gates.arrive(round, pick_end);
    debug!(truck = %truck, round = %round, t = pick_end.minutes(), "pick phase done");

    let summary = TruckSummary::new(&assignment, start, pick_end);
    let summary = match assignment.mode() {
        RoundMode::Loading => load(&fac, &gates, &assignment, summary).await,
        RoundMode::Staging => stage(&fac, &assignment, summary).await,
    };
    debug!(
        truck = %truck,
        round = %round,
        pallets = summary.pallets_post,
        merged = summary.merged,
        t = summary.end.minutes(),
        "truck round finished"
    );
    fac.push_truck(summary);
}

async fn load(
    fac: &Rc<Facility>,
    gates: &RoundGates,
    a: &TruckAssignment,
    mut summary: TruckSummary,
) -> TruckSummary {
    let env = &fac.env;
    let round = a.round;
    let truck = &a.truck;

    let requested = env.now();
    let permit = fac.yard.enter(env, truck, 1).await;

    for pallet in &a.pallets {
        if !pallet.is_mixed() {
            let op = Op::new(OpLabel::Dispatch, round, truck).pallet(pallet.id);
            fac.perform(op, PRIORITY_HIGH, &fac.samplers.dispatch).await;
        }
        // Read at request time: placements requested after round 1's gate
        // fires queue behind high-priority crane work.
        let op = Op::new(OpLabel::Placement, round, truck).pallet(pallet.id);
        fac.perform(op, gates.placement_priority(), &fac.samplers.placement).await;
    }

    let check_start = env.now();
    let checks: Vec<_> = a
        .pallets
        .iter()
        .map(|pallet| {
            let fac = Rc::clone(fac);
            let op = Op::new(OpLabel::Check, round, truck).pallet(pallet.id);
            env.spawn(async move { fac.perform(op, DEFAULT_PRIORITY, &fac.samplers.pallet_check).await })
        })
        .collect();
    let records = join_all(checks).await;
    let mut check_wait: f64 = records.iter().map(|r| r.wait).sum();

    let defective: Vec<&Pallet> = a
        .pallets
        .iter()
        .filter(|_| fac.with_rng(|rng| rng.gen_bool(fac.defect_probability)))
        .collect();
    for pallet in &defective {
        let op = Op::new(OpLabel::Correction, round, truck).pallet(pallet.id);
        fac.perform(op, PRIORITY_HIGH, &fac.samplers.correction).await;
        let op = Op::new(OpLabel::Recheck, round, truck).pallet(pallet.id);
        check_wait += fac.perform(op, DEFAULT_PRIORITY, &fac.samplers.pallet_check).await.wait;
    }
    let check_end = env.now();

    let (box_capacity, pallet_capacity) = fac.with_rng(|rng| {
        let boxes = fac.samplers.truck_capacity.sample_capacity(rng);
        let pallets = rng.uniform_int(fac.pallet_capacity.min, fac.pallet_capacity.max);
        (boxes, pallets)
    });
    let fusion = select_for_capacity(&a.pallets, box_capacity, pallet_capacity);
    if !fusion.merged.is_empty() {
        debug!(
            truck = %truck,
            kept = fusion.kept.len(),
            merged = fusion.merged.len(),
            box_capacity,
            pallet_capacity,
            "load exceeds truck capacity"
        );
    }

    for pallet in &fusion.kept {
        let op = Op::new(OpLabel::Load, round, truck).pallet(pallet.id);
        fac.perform(op, PRIORITY_HIGH, &fac.samplers.pallet_load).await;
    }
    fac.perform(Op::new(OpLabel::RackAdjust, round, truck), DEFAULT_PRIORITY, &fac.samplers.rack_adjust)
        .await;
    fac.perform(Op::new(OpLabel::Move, round, truck), DEFAULT_PRIORITY, &fac.samplers.move_truck).await;

    fac.push_stay(round, truck, requested, permit.entered(), permit.units());
    drop(permit);

    summary.pallets_post = fusion.kept.len() as u32;
    summary.boxes_post = fusion.kept.iter().map(|p| u64::from(p.boxes)).sum();
    summary.merged = fusion.merged.len() as u32;
    summary.corrected = defective.len() as u32;
    summary.end = env.now();
    summary.capacity = Some(CapacityDetail {
        box_capacity,
        pallet_capacity,
        limited_by: fusion.limited_by,
        check_phase_minutes: check_end.since(check_start),
        check_wait,
        checked_pallets: a.pallets.len() as u32,
    });
    summary.return_trip = Some(fac.sample(&fac.samplers.return_trip));
    summary.pallets = fusion.kept;
    summary
}

async fn stage(fac: &Facility, a: &TruckAssignment, mut summary: TruckSummary) -> TruckSummary {
    for pallet in &a.pallets {
        if pallet.is_mixed() {
            let op = Op::new(OpLabel::StageMixed, a.round, &a.truck).pallet(pallet.id);
            fac.perform(op, PRIORITY_LOW, &fac.samplers.placement).await;
        } else {
            let op = Op::new(OpLabel::StageComplete, a.round, &a.truck).pallet(pallet.id);
            fac.perform(op, PRIORITY_LOW, &fac.samplers.dispatch).await;
        }
    }
    summary.end = fac.env.now();
    summary
}

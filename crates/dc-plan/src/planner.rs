//! Round planning: pallets → per-truck, per-round assignments.
//!
//! Round 1 ("loading") packs trucks close to their sampled box capacity,
//! biggest pallets first.  Whatever does not fit goes to staging rounds that
//! pack looser, with shuffled pallets, until nothing is left or the round cap
//! is reached.

use std::collections::VecDeque;

use dc_core::{DcError, DcResult, RoundNo, ShiftRng, ShiftedWeibull, TruckId};
use tracing::{debug, info, warn};

use crate::fleet::{IdentitySource, TruckRoster, later_round_identity};
use crate::{Pallet, RoundPlan, ShiftPlan, TruckAssignment};

/// Fill target as fractions of a truck's sampled capacity.
///
/// A truck keeps taking pallets while its load is below `min × cap`, and
/// accepts the next pallet only if the load stays within
/// `max × cap + tolerance` boxes.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FillBand {
    pub min:       f64,
    pub max:       f64,
    pub tolerance: u32,
}

impl FillBand {
    pub const fn new(min: f64, max: f64, tolerance: u32) -> Self {
        Self { min, max, tolerance }
    }

    fn validate(&self, what: &str) -> DcResult<()> {
        if !(self.min > 0.0 && self.min <= self.max && self.max.is_finite()) {
            return Err(DcError::Config(format!(
                "{what}: fill band [{}, {}] must satisfy 0 < min <= max",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// `(fill-until, accept-limit)` in boxes for a truck of `capacity`.
    fn limits(&self, capacity: u32) -> (u64, u64) {
        let cap = f64::from(capacity);
        let fill = (cap * self.min).floor() as u64;
        let accept = (cap * self.max).floor() as u64 + u64::from(self.tolerance);
        (fill, accept)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Upper bound on trucks per round.
    pub max_trucks:       usize,
    /// Highest round number the planner may open.
    pub max_rounds:       u32,
    /// Pallets with at least this many boxes are "large".
    pub large_min_boxes:  u32,
    /// Pallets with at least this many boxes (and below `large`) are "medium".
    pub medium_min_boxes: u32,
    /// Share of a round-1 truck's capacity used to estimate how many trucks
    /// the shift needs.
    pub loading_sizing:   f64,
    pub loading_fill:     FillBand,
    /// Share of a staging truck's capacity that counts toward covering the
    /// leftover boxes.
    pub staging_sizing:   f64,
    /// Band applied to large pallets in staging rounds.
    pub staging_large:    FillBand,
    /// Band applied to every other pallet in staging rounds.
    pub staging_other:    FillBand,
    pub roster:           TruckRoster,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_trucks:       21,
            max_rounds:       5,
            large_min_boxes:  60,
            medium_min_boxes: 30,
            loading_sizing:   0.85,
            loading_fill:     FillBand::new(0.80, 0.90, 50),
            staging_sizing:   0.75,
            staging_large:    FillBand::new(0.70, 0.80, 50),
            staging_other:    FillBand::new(0.80, 0.80, 30),
            roster:           TruckRoster::default(),
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> DcResult<()> {
        if self.max_trucks == 0 {
            return Err(DcError::Config("max_trucks must be at least 1".into()));
        }
        if self.max_rounds == 0 {
            return Err(DcError::Config("max_rounds must be at least 1".into()));
        }
        if self.medium_min_boxes > self.large_min_boxes {
            return Err(DcError::Config(format!(
                "medium pallet threshold {} exceeds large threshold {}",
                self.medium_min_boxes, self.large_min_boxes
            )));
        }
        for (what, share) in [("loading_sizing", self.loading_sizing), ("staging_sizing", self.staging_sizing)] {
            if !(share > 0.0 && share.is_finite()) {
                return Err(DcError::Config(format!("{what} {share} must be > 0")));
            }
        }
        self.loading_fill.validate("loading")?;
        self.staging_large.validate("staging (large)")?;
        self.staging_other.validate("staging (other)")
    }
}

/// One truck's load before an identity is attached.
#[derive(Clone, Debug)]
pub(crate) struct Packing {
    pub pallets:  Vec<Pallet>,
    pub capacity: u32,
}

/// Build the whole shift plan.
///
/// `capacity` is the truck box-capacity distribution; every truck slot gets
/// its own draw.  The plan conserves pallets: every input pallet ends up in
/// exactly one assignment or in [`ShiftPlan::unassigned`].
pub fn build_plan(
    pallets:  &[Pallet],
    cfg:      &PlannerConfig,
    capacity: &ShiftedWeibull,
    rng:      &mut ShiftRng,
) -> DcResult<ShiftPlan> {
    cfg.validate()?;
    if pallets.is_empty() {
        return Ok(ShiftPlan::default());
    }

    let (round1, mut rest) = pack_loading_round(pallets, cfg, capacity, rng);
    debug!(trucks = round1.len(), leftover = rest.len(), "round 1 packed");

    let mut staged = Vec::new();
    let mut round = RoundNo(2);
    while !rest.is_empty() {
        if round.0 > cfg.max_rounds {
            warn!(
                pallets = rest.len(),
                max_rounds = cfg.max_rounds,
                "round cap reached, leaving pallets unassigned"
            );
            break;
        }
        let (packed, left) = pack_staging_round(rest, cfg, capacity, rng);
        rest = left;
        if packed.is_empty() {
            warn!(%round, pallets = rest.len(), "no staging truck could take a pallet");
            break;
        }
        debug!(%round, trucks = packed.len(), leftover = rest.len(), "staging round packed");
        staged.push((round, packed));
        round = round.next();
    }

    let plan = assign_identities(round1, staged, rest, &cfg.roster);
    info!(
        rounds = plan.rounds.len(),
        assignments = plan.assignments().count(),
        unassigned = plan.unassigned.len(),
        "shift plan built"
    );
    Ok(plan)
}

/// `count` capacity draws, largest first.
fn sample_capacities(count: usize, capacity: &ShiftedWeibull, rng: &mut ShiftRng) -> Vec<u32> {
    let mut caps: Vec<u32> = (0..count).map(|_| capacity.sample_capacity(rng)).collect();
    caps.sort_unstable_by(|a, b| b.cmp(a));
    caps
}

fn total_boxes<'a>(pallets: impl IntoIterator<Item = &'a Pallet>) -> u64 {
    pallets.into_iter().map(|p| u64::from(p.boxes)).sum()
}

/// Move pallets from `queue` into `load` while the load is below `fill` and
/// the head pallet keeps it within `accept`.
fn fill_from(queue: &mut VecDeque<Pallet>, load: &mut Vec<Pallet>, acc: &mut u64, fill: u64, accept: u64) {
    while *acc < fill {
        match queue.front() {
            Some(head) if *acc + u64::from(head.boxes) <= accept => {
                *acc += u64::from(head.boxes);
                if let Some(p) = queue.pop_front() {
                    load.push(p);
                }
            }
            _ => break,
        }
    }
}

fn pack_loading_round(
    pallets:  &[Pallet],
    cfg:      &PlannerConfig,
    capacity: &ShiftedWeibull,
    rng:      &mut ShiftRng,
) -> (Vec<Packing>, Vec<Pallet>) {
    let caps = sample_capacities(cfg.max_trucks, capacity, rng);
    let mean_effective =
        caps.iter().map(|&c| f64::from(c) * cfg.loading_sizing).sum::<f64>() / caps.len() as f64;
    let wanted = ((total_boxes(pallets) as f64 / mean_effective) as usize).clamp(1, cfg.max_trucks);

    // Large, medium, small; each biggest first.  The sort is stable so equal
    // sizes keep generation order.
    let mut buckets: [VecDeque<Pallet>; 3] = Default::default();
    let mut sorted = pallets.to_vec();
    sorted.sort_by(|a, b| b.boxes.cmp(&a.boxes));
    for p in sorted {
        let k = if p.boxes >= cfg.large_min_boxes {
            0
        } else if p.boxes >= cfg.medium_min_boxes {
            1
        } else {
            2
        };
        buckets[k].push_back(p);
    }

    let mut packed = Vec::new();
    for &cap in caps.iter().take(wanted) {
        let (fill, accept) = cfg.loading_fill.limits(cap);
        let mut load = Vec::new();
        let mut acc = 0;
        for bucket in buckets.iter_mut() {
            fill_from(bucket, &mut load, &mut acc, fill, accept);
        }
        if !load.is_empty() {
            packed.push(Packing { pallets: load, capacity: cap });
        }
    }

    let rest = buckets.into_iter().flatten().collect();
    (packed, rest)
}

fn pack_staging_round(
    pallets:  Vec<Pallet>,
    cfg:      &PlannerConfig,
    capacity: &ShiftedWeibull,
    rng:      &mut ShiftRng,
) -> (Vec<Packing>, Vec<Pallet>) {
    let caps = sample_capacities(cfg.max_trucks, capacity, rng);
    let remaining = total_boxes(&pallets) as f64;
    let mut covered = 0.0;
    let mut needed = 0;
    for &cap in &caps {
        covered += f64::from(cap) * cfg.staging_sizing;
        needed += 1;
        if covered >= remaining {
            break;
        }
    }

    let (mut large, mut other): (Vec<Pallet>, Vec<Pallet>) =
        pallets.into_iter().partition(|p| p.boxes >= cfg.large_min_boxes);
    rng.shuffle(&mut large);
    rng.shuffle(&mut other);
    let mut large = VecDeque::from(large);
    let mut other = VecDeque::from(other);

    let mut packed = Vec::new();
    for &cap in &caps[..needed] {
        let mut load = Vec::new();
        let mut acc = 0;
        let (fill, accept) = cfg.staging_large.limits(cap);
        fill_from(&mut large, &mut load, &mut acc, fill, accept);
        let (fill, accept) = cfg.staging_other.limits(cap);
        fill_from(&mut other, &mut load, &mut acc, fill, accept);
        if !load.is_empty() {
            packed.push(Packing { pallets: load, capacity: cap });
        }
    }

    let rest = large.into_iter().chain(other).collect();
    (packed, rest)
}

/// Attach truck identities.  Round 1 mints from the roster; later rounds
/// reuse round-1 identities by position and mint flagged surplus identities
/// for positions round 1 never filled.
pub(crate) fn assign_identities(
    round1:     Vec<Packing>,
    staged:     Vec<(RoundNo, Vec<Packing>)>,
    unassigned: Vec<Pallet>,
    roster:     &TruckRoster,
) -> ShiftPlan {
    let mut rounds = Vec::with_capacity(staged.len() + 1);

    let trucks: Vec<TruckAssignment> = round1
        .into_iter()
        .enumerate()
        .map(|(i, p)| TruckAssignment {
            truck:             roster.label(i),
            source:            IdentitySource::Minted,
            round:             RoundNo::FIRST,
            pallets:           p.pallets,
            planning_capacity: p.capacity,
        })
        .collect();
    let fleet: Vec<TruckId> = trucks.iter().map(|a| a.truck.clone()).collect();
    if !trucks.is_empty() {
        rounds.push(RoundPlan { round: RoundNo::FIRST, trucks });
    }

    for (round, packings) in staged {
        let trucks = packings
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let (truck, source) = later_round_identity(i, &fleet, roster);
                if source == IdentitySource::Surplus {
                    debug!(%round, %truck, "minting surplus truck identity");
                }
                TruckAssignment { truck, source, round, pallets: p.pallets, planning_capacity: p.capacity }
            })
            .collect();
        rounds.push(RoundPlan { round, trucks });
    }

    ShiftPlan { rounds, unassigned }
}

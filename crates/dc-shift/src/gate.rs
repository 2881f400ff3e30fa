//! Per-round completion barriers and the round-1 placement priority latch.
//!
//! Round `r` fires once every one of its trucks has finished picking.  Round
//! `r + 1` trucks wait on it before touching any resource.  Round 0 is
//! pre-fired so round 1 starts immediately, and a round with no trucks fires
//! at construction.

use std::cell::Cell;
use std::collections::BTreeMap;

use dc_core::{RoundNo, SimTime};
use dc_des::{Signal, SignalWait};
use tracing::info;

use crate::config::{PRIORITY_HIGH, PRIORITY_LOW};

pub struct RoundGate {
    round:    RoundNo,
    target:   u32,
    arrivals: Cell<u32>,
    signal:   Signal,
}

impl RoundGate {
    pub fn new(round: RoundNo, target: u32) -> Self {
        let signal = if target == 0 { Signal::fired(SimTime::ZERO) } else { Signal::new() };
        Self { round, target, arrivals: Cell::new(0), signal }
    }

    pub fn round(&self) -> RoundNo {
        self.round
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    /// Arrivals counted so far, including any past the target.
    pub fn arrivals(&self) -> u32 {
        self.arrivals.get()
    }

    /// Count one truck's pick completion.  Returns `true` for the call that
    /// fires the gate; arrivals past the target never fire it again.
    pub fn signal_arrival(&self, now: SimTime) -> bool {
        let n = self.arrivals.get() + 1;
        self.arrivals.set(n);
        if n == self.target {
            self.signal.fire(now);
            info!(round = %self.round, trucks = n, t = now.minutes(), "round pick phase complete");
            true
        } else {
            false
        }
    }

    pub fn is_complete(&self) -> bool {
        self.signal.is_fired()
    }

    pub fn completion_time(&self) -> Option<SimTime> {
        self.signal.fired_at()
    }

    pub fn wait(&self) -> SignalWait {
        self.signal.wait()
    }
}

/// Crane priority for round-1 placements.  Written once, by the firing of
/// round 1's gate; read by every placement when it requests the crane.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlacementPriority {
    Active,
    Demoted,
}

#[derive(Default)]
pub struct PriorityLatch {
    demoted: Cell<bool>,
}

impl PriorityLatch {
    pub fn state(&self) -> PlacementPriority {
        if self.demoted.get() { PlacementPriority::Demoted } else { PlacementPriority::Active }
    }

    pub fn priority(&self) -> i32 {
        match self.state() {
            PlacementPriority::Active => PRIORITY_HIGH,
            PlacementPriority::Demoted => PRIORITY_LOW,
        }
    }

    /// # Panics
    /// If the latch was already demoted.
    fn demote(&self) {
        assert!(!self.demoted.get(), "placement priority demoted twice");
        self.demoted.set(true);
    }
}

/// Every gate of a shift plus the placement latch.
pub struct RoundGates {
    gates: BTreeMap<RoundNo, RoundGate>,
    latch: PriorityLatch,
}

impl RoundGates {
    /// Gates for `(round, trucks)` pairs.  Round 0 is added pre-fired.
    pub fn new(targets: impl IntoIterator<Item = (RoundNo, u32)>) -> Self {
        let mut gates: BTreeMap<RoundNo, RoundGate> =
            targets.into_iter().map(|(r, n)| (r, RoundGate::new(r, n))).collect();
        gates.insert(RoundNo::NONE, RoundGate::new(RoundNo::NONE, 0));
        let latch = PriorityLatch::default();
        if gates.get(&RoundNo::FIRST).is_some_and(RoundGate::is_complete) {
            latch.demote();
        }
        Self { gates, latch }
    }

    pub fn gate(&self, round: RoundNo) -> Option<&RoundGate> {
        self.gates.get(&round)
    }

    pub fn gates(&self) -> impl Iterator<Item = &RoundGate> {
        self.gates.values().filter(|g| g.round != RoundNo::NONE)
    }

    /// Wait for `round`'s gate.  A round that has no gate counts as done.
    pub fn wait(&self, round: RoundNo) -> SignalWait {
        match self.gates.get(&round) {
            Some(g) => g.wait(),
            None => Signal::fired(SimTime::ZERO).wait(),
        }
    }

    /// Count a truck's pick completion for `round`; demotes round-1
    /// placements when round 1's gate fires.
    pub fn arrive(&self, round: RoundNo, now: SimTime) {
        let Some(gate) = self.gates.get(&round) else { return };
        if gate.signal_arrival(now) && round.is_first() {
            self.latch.demote();
        }
    }

    pub fn placement_priority(&self) -> i32 {
        self.latch.priority()
    }

    pub fn placement_state(&self) -> PlacementPriority {
        self.latch.state()
    }

    pub fn completion_time(&self, round: RoundNo) -> Option<SimTime> {
        self.gates.get(&round).and_then(RoundGate::completion_time)
    }
}

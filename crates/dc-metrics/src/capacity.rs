//! Step-function capacity over a shift.
//!
//! Crew sizes change at fixed clock times, so a station's capacity is a
//! right-continuous step function starting at `t = 0`.  Utilization divides
//! busy time by the integral of this function, not by `capacity × duration`.

use dc_core::SimTime;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapacityProfile {
    /// `(from, capacity)` sorted by `from`; the first entry is at zero.
    steps: Vec<(SimTime, u32)>,
}

impl CapacityProfile {
    /// Constant capacity for the whole horizon.
    pub fn constant(capacity: u32) -> Self {
        Self { steps: vec![(SimTime::ZERO, capacity)] }
    }

    /// Add a change at `at`.  A change at an instant that already has one
    /// replaces it; changes at negative instants set the initial capacity.
    pub fn set(&mut self, at: SimTime, capacity: u32) {
        let at = at.max(SimTime::ZERO);
        match self.steps.binary_search_by(|(t, _)| t.cmp(&at)) {
            Ok(i) => self.steps[i].1 = capacity,
            Err(i) => self.steps.insert(i, (at, capacity)),
        }
    }

    pub fn with_change(mut self, at: SimTime, capacity: u32) -> Self {
        self.set(at, capacity);
        self
    }

    pub fn steps(&self) -> &[(SimTime, u32)] {
        &self.steps
    }

    pub fn capacity_at(&self, t: SimTime) -> u32 {
        let idx = self.steps.partition_point(|(from, _)| *from <= t);
        // `steps[0]` starts at zero, so only negative instants land on idx 0.
        self.steps[idx.saturating_sub(1)].1
    }

    pub fn max_capacity(&self) -> u32 {
        self.steps.iter().map(|(_, c)| *c).max().unwrap_or(0)
    }

    /// `∫ capacity(t) dt` over `[from, to]`, in slot-minutes.
    pub fn integral(&self, from: SimTime, to: SimTime) -> f64 {
        if to <= from {
            return 0.0;
        }
        let mut total = 0.0;
        for (i, &(start, cap)) in self.steps.iter().enumerate() {
            let end = self.steps.get(i + 1).map_or(to, |(next, _)| *next);
            let lo = start.max(from);
            let hi = end.min(to);
            if hi > lo {
                total += f64::from(cap) * hi.since(lo);
            }
        }
        total
    }
}

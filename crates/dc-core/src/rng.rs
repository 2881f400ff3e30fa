//! Deterministic shift-level RNG wrapper.
//!
//! # Determinism strategy
//!
//! A shift owns exactly one `ShiftRng`.  Every process draws from it in the
//! order the executor resumes processes, and that order is itself
//! deterministic (ready queue FIFO, timers keyed by time then insertion), so
//! one seed reproduces the whole shift.
//!
//! Independent streams (one per replication, the planner's stream, …) are
//! derived with [`ShiftRng::child`]:
//!
//!   seed = parent.next_u64() XOR (offset * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive offsets uniformly across the seed space.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Shift-level deterministic RNG.
///
/// Implements [`RngCore`] so `rand_distr` distributions sample from it
/// directly (`dist.sample(&mut rng)`).
pub struct ShiftRng(SmallRng);

impl ShiftRng {
    pub fn new(seed: u64) -> Self {
        ShiftRng(SmallRng::seed_from_u64(seed))
    }

    /// A seed drawn from OS entropy, for callers that did not supply one.
    pub fn entropy_seed() -> u64 {
        rand::random()
    }

    /// Seed derived from `base` and a replication/stream offset without
    /// consuming any parent state.
    pub fn mixed_seed(base: u64, offset: u64) -> u64 {
        base ^ offset.wrapping_mul(MIXING_CONSTANT)
    }

    /// Derive a child `ShiftRng` with a different seed offset.
    pub fn child(&mut self, offset: u64) -> ShiftRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        ShiftRng(SmallRng::seed_from_u64(child_seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// `U(0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// Uniform in `[low, high]`; returns `low` when the range is degenerate.
    #[inline]
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            self.0.gen_range(low..=high)
        } else {
            low
        }
    }

    /// Uniform integer in `[low, high]` (inclusive).
    #[inline]
    pub fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        if high > low {
            self.0.gen_range(low..=high)
        } else {
            low
        }
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }
}

impl RngCore for ShiftRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}

//! Simulation time model.
//!
//! # Design
//!
//! Time is a continuous `SimTime` measured in minutes since the start of the
//! shift being simulated.  Each shift runs on its own clock starting at 0;
//! the mapping to time-of-day is held in `ShiftWindow`:
//!
//!   minute_of_day = window.start_min + sim_time
//!
//! `SimTime` wraps an `f64` but is totally ordered (`f64::total_cmp`) so it
//! can key a `BTreeMap` of pending timers.  Durations are plain `f64`
//! minutes.

use std::cmp::Ordering;
use std::fmt;

use crate::{DcError, DcResult};

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An instant on a shift's virtual clock, in minutes.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn minutes(self) -> f64 {
        self.0
    }

    /// Minutes elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }

    /// The instant `minutes` after `self`.
    #[inline]
    pub fn after(self, minutes: f64) -> SimTime {
        SimTime(self.0 + minutes)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.2}", self.0)
    }
}

// ── ShiftWindow ───────────────────────────────────────────────────────────────

/// Nominal shift window in minutes of day.  `end_min` may exceed 1440 only
/// through overrun, never in configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftWindow {
    pub start_min: f64,
    pub end_min:   f64,
}

impl ShiftWindow {
    /// 00:00 → 08:00.
    pub const NIGHT: ShiftWindow = ShiftWindow { start_min: 0.0, end_min: 480.0 };
    /// 08:00 → 24:00.
    pub const DAY: ShiftWindow = ShiftWindow { start_min: 480.0, end_min: 1440.0 };

    pub fn new(start_min: f64, end_min: f64) -> DcResult<Self> {
        let window = Self { start_min, end_min };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> DcResult<()> {
        if !self.start_min.is_finite() || !self.end_min.is_finite() {
            return Err(DcError::Config("shift window bounds must be finite".into()));
        }
        if self.end_min <= self.start_min {
            return Err(DcError::Config(format!(
                "shift window end ({}) must be after start ({})",
                self.end_min, self.start_min
            )));
        }
        Ok(())
    }

    /// Nominal shift length in minutes.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_min - self.start_min
    }

    /// Nominal end on the shift clock.
    #[inline]
    pub fn nominal_end(&self) -> SimTime {
        SimTime(self.duration())
    }

    /// Convert a shift-clock instant to minutes of day.
    #[inline]
    pub fn absolute(&self, t: SimTime) -> f64 {
        self.start_min + t.0
    }

    /// Convert minutes of day to the shift clock (may be negative).
    #[inline]
    pub fn relative(&self, minute_of_day: f64) -> SimTime {
        SimTime(minute_of_day - self.start_min)
    }

    /// Time-of-day label for a shift-clock instant.
    pub fn label(&self, t: SimTime) -> String {
        clock_label(self.absolute(t))
    }
}

/// Format absolute minutes as `HH:MM`, prefixing `D+n` once the clock rolls
/// past midnight.  Useful for logging without a datetime library.
pub fn clock_label(minute_of_day: f64) -> String {
    let total = minute_of_day.max(0.0).round() as u64;
    let days = total / 1_440;
    let hours = (total % 1_440) / 60;
    let minutes = total % 60;
    if days == 0 {
        format!("{hours:02}:{minutes:02}")
    } else {
        format!("D+{days} {hours:02}:{minutes:02}")
    }
}

//! Shift configuration.
//!
//! `ShiftConfig::default()` is the night preset (00:00–08:00); `ShiftConfig::day()`
//! is the day preset (08:00–24:00) with its two crew blocks.  Every struct
//! deserializes with `#[serde(default)]`, so a JSON override only needs the
//! fields it changes.

use dc_core::{
    ChiSquaredParams, LogNormalParams, ReturnTripParams, ShiftWindow, SimTime,
    TruncatedLogNormalParams, UniformRange, WeibullParams, clock_label,
};
use dc_metrics::Station;
use dc_plan::{PalletMix, PlannerConfig};
use serde::{Deserialize, Serialize};

use crate::{EngineResult, ShiftError};

/// Crane priority of round-1 work and of the placement latch while round 1
/// is still picking.  Lower is served first.
pub const PRIORITY_HIGH: i32 = 0;
/// Crane priority of staging work and of demoted placements.
pub const PRIORITY_LOW: i32 = 1;

// ── Crew ──────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewSizes {
    pub pickers:        u32,
    pub cranes:         u32,
    pub checkers:       u32,
    pub rack_adjusters: u32,
    pub movers:         u32,
    pub gate_staff:     u32,
}

impl Default for CrewSizes {
    fn default() -> Self {
        Self { pickers: 14, cranes: 5, checkers: 2, rack_adjusters: 1, movers: 1, gate_staff: 1 }
    }
}

impl CrewSizes {
    pub fn get(&self, station: Station) -> Option<u32> {
        match station {
            Station::Picker => Some(self.pickers),
            Station::Crane => Some(self.cranes),
            Station::Checker => Some(self.checkers),
            Station::RackAdjuster => Some(self.rack_adjusters),
            Station::Mover => Some(self.movers),
            Station::Gate => Some(self.gate_staff),
            Station::Yard => None,
        }
    }
}

/// Partial crew: `None` keeps the current size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewOverride {
    pub pickers:        Option<u32>,
    pub cranes:         Option<u32>,
    pub checkers:       Option<u32>,
    pub rack_adjusters: Option<u32>,
    pub movers:         Option<u32>,
    pub gate_staff:     Option<u32>,
}

impl CrewOverride {
    pub fn get(&self, station: Station) -> Option<u32> {
        match station {
            Station::Picker => self.pickers,
            Station::Crane => self.cranes,
            Station::Checker => self.checkers,
            Station::RackAdjuster => self.rack_adjusters,
            Station::Mover => self.movers,
            Station::Gate => self.gate_staff,
            Station::Yard => None,
        }
    }
}

/// A crew change at a fixed clock time.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrewChange {
    /// Minute of day (may exceed 1440 for after-midnight changes).
    pub at_min: f64,
    pub crew:   CrewOverride,
}

impl CrewChange {
    pub fn at_clock(&self) -> String {
        clock_label(self.at_min)
    }
}

// ── Timing and distributions ──────────────────────────────────────────────────

/// Uniform task times in minutes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTimes {
    pub placement:   UniformRange,
    pub correction:  UniformRange,
    pub rack_adjust: UniformRange,
    pub move_truck:  UniformRange,
}

impl Default for TaskTimes {
    fn default() -> Self {
        Self {
            placement:   UniformRange::new(0.5, 1.5),
            correction:  UniformRange::new(2.0, 3.0),
            rack_adjust: UniformRange::new(3.0, 5.0),
            move_truck:  UniformRange::new(2.0, 4.0),
        }
    }
}

/// Log-normal clamped to an operational band.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandedParams {
    pub shape: LogNormalParams,
    pub low:   f64,
    pub high:  f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distributions {
    /// Truck box capacity, used by the planner and by round-1 fusion.
    pub truck_capacity: WeibullParams,
    pub pick_prep:      ChiSquaredParams,
    pub pallet_check:   TruncatedLogNormalParams,
    pub pallet_load:    BandedParams,
    pub dispatch:       BandedParams,
    pub return_trip:    ReturnTripParams,
    /// Ad-hoc arrivals per shift.
    pub adhoc_count:    WeibullParams,
    /// Ad-hoc checkpoint 0→1 (gate in).
    pub adhoc_gate_in:  WeibullParams,
    /// Ad-hoc checkpoint 1→2 (checker).
    pub adhoc_check:    LogNormalParams,
    /// Ad-hoc checkpoint 2→3 (gate out).
    pub adhoc_gate_out: LogNormalParams,
}

impl Default for Distributions {
    fn default() -> Self {
        Self {
            truck_capacity: WeibullParams { alpha: 4.2, beta: 620.0, gamma: 280.0 },
            pick_prep:      ChiSquaredParams::default(),
            pallet_check:   TruncatedLogNormalParams::default(),
            pallet_load:    BandedParams {
                shape: LogNormalParams { mu: 0.3, sigma: 0.35, gamma: 0.2 },
                low:   0.1,
                high:  2.5,
            },
            dispatch:       BandedParams {
                shape: LogNormalParams { mu: 0.4, sigma: 0.3, gamma: 0.1 },
                low:   0.2,
                high:  2.5,
            },
            return_trip:    ReturnTripParams::default(),
            adhoc_count:    WeibullParams { alpha: 2.0263, beta: 8.9071, gamma: 0.0 },
            adhoc_gate_in:  WeibullParams { alpha: 0.59478, beta: 13.355, gamma: 1.1574e-5 },
            adhoc_check:    LogNormalParams { mu: 4.9548, sigma: 0.24631, gamma: -84.283 },
            adhoc_gate_out: LogNormalParams { mu: 1.2676, sigma: 1.4692, gamma: -0.00426 },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdhocConfig {
    pub enabled:       bool,
    /// Cap on the sampled daily count.
    pub max_per_shift: u32,
    pub id_prefix:     String,
    /// Yard units an ad-hoc truck holds from gate-in to gate-out.
    pub yard_units:    u32,
}

impl Default for AdhocConfig {
    fn default() -> Self {
        Self { enabled: true, max_per_shift: 30, id_prefix: "T1".into(), yard_units: 2 }
    }
}

/// The crew's meal break.  Operations are not paused; instants at or after
/// `start_min` read `duration_min` later on the wall clock.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LunchBreak {
    /// Shift-clock minute the break starts.
    pub start_min:    f64,
    pub duration_min: f64,
}

impl LunchBreak {
    /// Wall-clock reading of shift instant `t`.
    pub fn wall(&self, t: SimTime) -> SimTime {
        if t.minutes() >= self.start_min { t.after(self.duration_min) } else { t }
    }
}

/// Inclusive integer range for a truck's pallet-count capacity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

// ── ShiftConfig ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    pub window:                ShiftWindow,
    pub crew:                  CrewSizes,
    /// Crew changes applied at fixed clock times, in any order.
    pub crew_schedule:         Vec<CrewChange>,
    /// Yard equivalent units.
    pub yard_capacity:         u32,
    pub defect_probability:    f64,
    pub truck_pallet_capacity: CountRange,
    pub pallets:               PalletMix,
    pub planner:               PlannerConfig,
    pub times:                 TaskTimes,
    pub distributions:         Distributions,
    pub adhoc:                 AdhocConfig,
    /// Effective picking hours per picker, for the productivity index.
    pub effective_hours:       f64,
    /// Offset applied to reported clock times; `None` reports the raw clock.
    pub lunch:                 Option<LunchBreak>,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            window:                ShiftWindow::NIGHT,
            crew:                  CrewSizes::default(),
            crew_schedule:         Vec::new(),
            yard_capacity:         16,
            defect_probability:    0.02,
            truck_pallet_capacity: CountRange { min: 10, max: 16 },
            pallets:               PalletMix::default(),
            planner:               PlannerConfig::default(),
            times:                 TaskTimes::default(),
            distributions:         Distributions::default(),
            adhoc:                 AdhocConfig::default(),
            effective_hours:       7.1,
            lunch:                 Some(LunchBreak { start_min: 150.0, duration_min: 30.0 }),
        }
    }
}

impl ShiftConfig {
    /// Day preset: 08:00–24:00, a four-unit yard and two crew blocks.
    pub fn day() -> Self {
        let block = |cranes, checkers| CrewOverride {
            cranes: Some(cranes),
            checkers: Some(checkers),
            rack_adjusters: Some(1),
            movers: Some(1),
            gate_staff: Some(1),
            ..CrewOverride::default()
        };
        Self {
            window: ShiftWindow::DAY,
            yard_capacity: 4,
            crew_schedule: vec![
                CrewChange { at_min: 480.0, crew: block(4, 2) },
                CrewChange { at_min: 960.0, crew: block(2, 1) },
            ],
            times: TaskTimes {
                rack_adjust: UniformRange::new(1.5, 3.0),
                move_truck: UniformRange::new(1.3, 1.4),
                ..TaskTimes::default()
            },
            lunch: None,
            ..Self::default()
        }
    }

    /// Reject anything that would fail once the clock is running.
    /// Distribution parameters are checked when the samplers are built.
    pub fn validate(&self) -> EngineResult<()> {
        self.window.validate()?;
        for station in Station::ALL {
            if self.crew.get(station) == Some(0) {
                return Err(ShiftError::Config(format!("crew for {station} must be at least 1")));
            }
        }
        for change in &self.crew_schedule {
            if !change.at_min.is_finite() {
                return Err(ShiftError::Config("crew change time is not finite".into()));
            }
            for station in Station::ALL {
                if change.crew.get(station) == Some(0) {
                    return Err(ShiftError::Config(format!(
                        "crew change at {} sets {station} to zero",
                        change.at_clock()
                    )));
                }
            }
        }
        if self.yard_capacity == 0 {
            return Err(ShiftError::Config("yard capacity must be at least 1".into()));
        }
        if self.adhoc.enabled && (self.adhoc.yard_units == 0 || self.adhoc.yard_units > self.yard_capacity) {
            return Err(ShiftError::Config(format!(
                "ad-hoc trucks need {} yard units but the yard holds {}",
                self.adhoc.yard_units, self.yard_capacity
            )));
        }
        if !(0.0..=1.0).contains(&self.defect_probability) {
            return Err(ShiftError::Config(format!(
                "defect probability {} is outside [0, 1]",
                self.defect_probability
            )));
        }
        let CountRange { min, max } = self.truck_pallet_capacity;
        if min > max {
            return Err(ShiftError::Config(format!("truck pallet capacity [{min}, {max}] is inverted")));
        }
        if !(self.effective_hours.is_finite() && self.effective_hours > 0.0) {
            return Err(ShiftError::Config("effective hours must be > 0".into()));
        }
        if let Some(lunch) = &self.lunch {
            let valid = |m: f64| m.is_finite() && m >= 0.0;
            if !(valid(lunch.start_min) && valid(lunch.duration_min)) {
                return Err(ShiftError::Config(format!(
                    "lunch break at {} for {} min is invalid",
                    lunch.start_min, lunch.duration_min
                )));
            }
        }
        self.pallets.validate()?;
        self.planner.validate()?;
        self.times.placement.validate("placement")?;
        self.times.correction.validate("correction")?;
        self.times.rack_adjust.validate("rack adjust")?;
        self.times.move_truck.validate("truck move")?;
        Ok(())
    }

    /// Shift instant `t` as the wall clock reads it, lunch included.
    pub fn wall_clock(&self, t: SimTime) -> SimTime {
        self.lunch.map_or(t, |lunch| lunch.wall(t))
    }

    /// `HH:MM` label of [`wall_clock`](Self::wall_clock).
    pub fn wall_label(&self, t: SimTime) -> String {
        self.window.label(self.wall_clock(t))
    }

    /// Largest crew a station ever has during the shift.
    pub fn peak_crew(&self, station: Station) -> u32 {
        let base = self.crew.get(station).unwrap_or(0);
        self.crew_schedule
            .iter()
            .filter_map(|c| c.crew.get(station))
            .fold(base, u32::max)
    }
}

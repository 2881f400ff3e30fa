//! Samplers built once per run from [`Distributions`] and [`TaskTimes`].

use dc_core::{
    BandedLogNormal, ChiSquaredPrep, DcResult, ReturnTrip, ShiftedLogNormal, ShiftedWeibull,
    TruncatedLogNormal, UniformRange,
};

use crate::config::{Distributions, TaskTimes};

#[derive(Copy, Clone, Debug)]
pub(crate) struct Samplers {
    pub truck_capacity: ShiftedWeibull,
    pub pick_prep:      ChiSquaredPrep,
    pub pallet_check:   TruncatedLogNormal,
    pub pallet_load:    BandedLogNormal,
    pub dispatch:       BandedLogNormal,
    pub return_trip:    ReturnTrip,
    pub adhoc_count:    ShiftedWeibull,
    pub adhoc_gate_in:  ShiftedWeibull,
    pub adhoc_check:    ShiftedLogNormal,
    pub adhoc_gate_out: ShiftedLogNormal,
    pub placement:      UniformRange,
    pub correction:     UniformRange,
    pub rack_adjust:    UniformRange,
    pub move_truck:     UniformRange,
}

impl Samplers {
    pub fn new(d: &Distributions, times: &TaskTimes) -> DcResult<Self> {
        Ok(Self {
            truck_capacity: ShiftedWeibull::new(d.truck_capacity)?,
            pick_prep:      ChiSquaredPrep::new(d.pick_prep)?,
            pallet_check:   TruncatedLogNormal::new(d.pallet_check)?,
            pallet_load:    BandedLogNormal::new(d.pallet_load.shape, d.pallet_load.low, d.pallet_load.high)?,
            dispatch:       BandedLogNormal::new(d.dispatch.shape, d.dispatch.low, d.dispatch.high)?,
            return_trip:    ReturnTrip::new(d.return_trip)?,
            adhoc_count:    ShiftedWeibull::new(d.adhoc_count)?,
            adhoc_gate_in:  ShiftedWeibull::new(d.adhoc_gate_in)?,
            adhoc_check:    ShiftedLogNormal::new(d.adhoc_check)?,
            adhoc_gate_out: ShiftedLogNormal::new(d.adhoc_gate_out)?,
            placement:      times.placement,
            correction:     times.correction,
            rack_adjust:    times.rack_adjust,
            move_truck:     times.move_truck,
        })
    }
}

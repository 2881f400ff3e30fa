//! Unscheduled ("T1") trucks.
//!
//! The daily count and the arrival instants are drawn before the clock
//! starts.  Each arrival runs gate-in → checker → gate-out while holding
//! two yard units from gate-in until gate-out completes.  The stream ignores
//! rounds and gates; it only competes for the gate, checkers and yard.

use std::rc::Rc;

use dc_core::{RoundNo, ShiftRng, SimTime, TruckId};
use dc_des::DEFAULT_PRIORITY;
use dc_metrics::OpLabel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AdhocConfig;
use crate::facility::{Facility, Op};
use crate::samplers::Samplers;

/// A planned ad-hoc arrival.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdhocArrival {
    pub truck: TruckId,
    pub at:    SimTime,
}

/// One ad-hoc truck's visit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdhocSummary {
    pub truck:    TruckId,
    pub arrival:  SimTime,
    pub yard_in:  SimTime,
    pub departed: SimTime,
}

impl AdhocSummary {
    pub fn turnaround(&self) -> f64 {
        self.departed.since(self.arrival)
    }
}

/// Draw the day's arrivals: a capped Weibull count, then that many uniform
/// instants over `[0, duration]`, sorted and labelled in arrival order.
pub(crate) fn plan_arrivals(
    cfg: &AdhocConfig,
    samplers: &Samplers,
    duration: f64,
    rng: &mut ShiftRng,
) -> Vec<AdhocArrival> {
    if !cfg.enabled {
        return Vec::new();
    }
    let n = samplers.adhoc_count.sample_count(rng, cfg.max_per_shift);
    let mut times: Vec<f64> = (0..n).map(|_| rng.uniform(0.0, duration)).collect();
    times.sort_by(f64::total_cmp);
    let arrivals: Vec<AdhocArrival> = times
        .into_iter()
        .enumerate()
        .map(|(i, t)| AdhocArrival { truck: TruckId::adhoc(&cfg.id_prefix, i as u32 + 1), at: SimTime(t) })
        .collect();
    info!(count = arrivals.len(), "ad-hoc arrivals planned");
    arrivals
}

pub(crate) async fn adhoc_truck(fac: Rc<Facility>, arrival: AdhocArrival, yard_units: u32) {
    let env = fac.env.clone();
    env.timeout_until(arrival.at).await;
    let truck = arrival.truck.clone();
    debug!(truck = %truck, t = arrival.at.minutes(), "ad-hoc arrival");

    let op = Op::new(OpLabel::GateIn, RoundNo::NONE, &truck);
    fac.perform(op, DEFAULT_PRIORITY, &fac.samplers.adhoc_gate_in).await;

    let requested = env.now();
    let permit = fac.yard.enter(&env, &truck, yard_units).await;
    let op = Op::new(OpLabel::AdhocCheck, RoundNo::NONE, &truck);
    fac.perform(op, DEFAULT_PRIORITY, &fac.samplers.adhoc_check).await;
    let op = Op::new(OpLabel::GateOut, RoundNo::NONE, &truck);
    fac.perform(op, DEFAULT_PRIORITY, &fac.samplers.adhoc_gate_out).await;
    let yard_in = permit.entered();
    fac.push_stay(RoundNo::NONE, &truck, requested, yard_in, permit.units());
    drop(permit);

    fac.push_adhoc(AdhocSummary {
        truck,
        arrival: arrival.at,
        yard_in,
        departed: env.now(),
    });
}

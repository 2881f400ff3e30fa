//! Day shift: check and load what the night shift staged.
//!
//! Every staged pallet goes into one checking queue served by a pool of
//! checker workers.  Each truck with staged lots becomes available either
//! at once (it stayed at the dock) or at its handoff return estimate, then
//! loads its lots in round order: wait for the lot's checks, take a yard
//! unit, load every pallet on the crane, pass the rack adjuster, depart,
//! and drive the round trip before the next lot.  Ad-hoc trucks run
//! alongside.  The run stops at the nominal shift end; anything still in
//! progress is reported as unfinished.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use dc_core::{RoundNo, ShiftRng, SimTime, TruckId};
use dc_des::{DEFAULT_PRIORITY, Signal, Sim, Store};
use dc_metrics::{OpLabel, Station, StatsReport, utilization};
use dc_plan::Pallet;
use futures::future::join_all;
use tracing::{debug, info};

use crate::EngineResult;
use crate::adhoc::{adhoc_truck, plan_arrivals};
use crate::config::{PRIORITY_HIGH, ShiftConfig};
use crate::crew::{crew_manager, crew_profiles};
use crate::facility::{Facility, Op};
use crate::handoff::{ShiftHandoffState, StagedLoad};
use crate::result::{DayLoad, DayShiftResult, TruckMovement};
use crate::samplers::Samplers;

struct CheckJob {
    truck:  TruckId,
    round:  RoundNo,
    pallet: Pallet,
    done:   Signal,
}

/// A staged lot with one completion signal per pallet.
struct Lot {
    load:    StagedLoad,
    checked: Vec<Signal>,
}

#[derive(Default)]
struct Movements {
    loads:      Vec<DayLoad>,
    departures: Vec<TruckMovement>,
    returns:    Vec<TruckMovement>,
}

async fn checker_worker(fac: Rc<Facility>, queue: Store<CheckJob>) {
    loop {
        let job = queue.get().await;
        let op = Op::new(OpLabel::DayCheck, job.round, &job.truck).pallet(job.pallet.id);
        fac.perform(op, DEFAULT_PRIORITY, &fac.samplers.pallet_check).await;
        job.done.fire(fac.env.now());
    }
}

async fn truck_day(
    fac: Rc<Facility>,
    moves: Rc<RefCell<Movements>>,
    truck: TruckId,
    returning: Option<SimTime>,
    lots: Vec<Lot>,
    start_min: f64,
) {
    let env = fac.env.clone();
    // Trucks without a return estimate start at the dock.
    if let Some(eta) = returning {
        let back = env.timeout_until(eta).await;
        debug!(truck = %truck, t = back.minutes(), "truck back at the dock");
        moves.borrow_mut().returns.push(TruckMovement {
            truck:   truck.clone(),
            round:   RoundNo::FIRST,
            at_min:  start_min + back.minutes(),
            pallets: 0,
            boxes:   0,
        });
    }

    for lot in lots {
        let round = lot.load.origin_round;
        let ready = env.now();
        join_all(lot.checked.iter().map(Signal::wait)).await;
        let checked = env.now();

        let requested = env.now();
        let permit = fac.yard.enter(&env, &truck, 1).await;
        for pallet in &lot.load.pallets {
            let op = Op::new(OpLabel::DayLoad, round, &truck).pallet(pallet.id);
            fac.perform(op, PRIORITY_HIGH, &fac.samplers.pallet_load).await;
        }
        fac.perform(Op::new(OpLabel::RackAdjust, round, &truck), DEFAULT_PRIORITY, &fac.samplers.rack_adjust)
            .await;
        fac.push_stay(round, &truck, requested, permit.entered(), permit.units());
        drop(permit);

        let loaded = env.now();
        let pallets = lot.load.pallets.len() as u32;
        let boxes = lot.load.boxes;
        debug!(truck = %truck, round = %round, pallets, t = loaded.minutes(), "day departure");
        {
            let mut m = moves.borrow_mut();
            m.loads.push(DayLoad { truck: truck.clone(), round, pallets, boxes, ready, checked, loaded });
            m.departures.push(TruckMovement {
                truck: truck.clone(),
                round,
                at_min: start_min + loaded.minutes(),
                pallets,
                boxes,
            });
        }

        let trip = fac.sample(&fac.samplers.return_trip);
        let back = env.timeout(trip).await;
        moves.borrow_mut().returns.push(TruckMovement {
            truck: truck.clone(),
            round,
            at_min: start_min + back.minutes(),
            pallets,
            boxes,
        });
    }
}

/// Run a day shift from a night shift's handoff.
pub fn run_day_shift(
    handoff: &ShiftHandoffState,
    cfg: &ShiftConfig,
    seed: Option<u64>,
) -> EngineResult<DayShiftResult> {
    cfg.validate()?;
    let samplers = Samplers::new(&cfg.distributions, &cfg.times)?;
    let seed = seed.unwrap_or_else(ShiftRng::entropy_seed);
    let mut rng = ShiftRng::new(seed);
    let arrivals = plan_arrivals(&cfg.adhoc, &samplers, cfg.window.duration(), &mut rng);

    let mut sim = Sim::new();
    let fac = Rc::new(Facility::new(sim.env(), cfg, samplers, rng));
    let moves: Rc<RefCell<Movements>> = Rc::default();
    let queue: Store<CheckJob> = Store::new();

    // Lots per truck in round order; every pallet is queued for checking in
    // the same order.
    let mut itineraries: BTreeMap<TruckId, Vec<Lot>> = BTreeMap::new();
    let mut staged = handoff.staged_pallets_ready.clone();
    staged.sort_by(|a, b| a.origin_round.cmp(&b.origin_round).then_with(|| a.truck.cmp(&b.truck)));
    for load in staged {
        let checked: Vec<Signal> = load.pallets.iter().map(|_| Signal::new()).collect();
        for (pallet, done) in load.pallets.iter().zip(&checked) {
            queue.put(CheckJob {
                truck:  load.truck.clone(),
                round:  load.origin_round,
                pallet: *pallet,
                done:   done.clone(),
            });
        }
        itineraries.entry(load.truck.clone()).or_default().push(Lot { load, checked });
    }
    for en_route in &handoff.trucks_en_route {
        itineraries.entry(en_route.truck.clone()).or_default();
    }
    let lot_count: usize = itineraries.values().map(Vec::len).sum();
    let staged_pallets = handoff.staged_pallets();
    info!(
        seed,
        trucks = itineraries.len(),
        lots = lot_count,
        pallets = staged_pallets,
        adhoc = arrivals.len(),
        start = %cfg.window.label(SimTime::ZERO),
        "day shift starting"
    );

    if !cfg.crew_schedule.is_empty() {
        sim.spawn(crew_manager(Rc::clone(&fac), cfg.clone()));
    }
    for _ in 0..cfg.peak_crew(Station::Checker) {
        sim.spawn(checker_worker(Rc::clone(&fac), queue.clone()));
    }
    for (truck, lots) in itineraries {
        let returning = handoff
            .en_route(&truck)
            .and_then(|t| t.estimated_return_min)
            .map(|eta| cfg.window.relative(eta).max(SimTime::ZERO));
        sim.spawn(truck_day(Rc::clone(&fac), Rc::clone(&moves), truck, returning, lots, cfg.window.start_min));
    }
    for arrival in arrivals {
        sim.spawn(adhoc_truck(Rc::clone(&fac), arrival, cfg.adhoc.yard_units));
    }

    let end = sim.run_until(cfg.window.nominal_end());

    let operations = fac.take_log();
    let Movements { loads, mut departures, mut returns } = moves.take();
    departures.sort_by(|a, b| a.at_min.total_cmp(&b.at_min));
    returns.sort_by(|a, b| a.at_min.total_cmp(&b.at_min));
    let pallets_checked = operations.by_label(OpLabel::DayCheck).count() as u32;
    let result = DayShiftResult {
        seed,
        config: cfg.clone(),
        staged_pallets,
        pallets_checked,
        unfinished_lots: lot_count - loads.len(),
        loads,
        departures,
        returns,
        adhoc: fac.take_adhoc(),
        stats: StatsReport::from_records(operations.iter()),
        utilization: utilization(operations.iter(), &crew_profiles(cfg), end),
        operations,
        yard_trace: fac.yard.trace(),
        end,
    };
    info!(
        departures = result.departures.len(),
        returns = result.returns.len(),
        checked = result.pallets_checked,
        unfinished = result.unfinished_lots,
        "day shift finished"
    );
    Ok(result)
}

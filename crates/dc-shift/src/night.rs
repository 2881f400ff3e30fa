//! Night shift: plan, run every truck round and the ad-hoc stream, then
//! reduce the logs.

use std::rc::Rc;

use dc_core::{ShiftRng, SimTime};
use dc_des::Sim;
use dc_metrics::{StatsReport, utilization};
use dc_plan::{FleetReuse, PalletSummary, build_plan, generate_pallets};
use tracing::info;

use crate::adhoc::{adhoc_truck, plan_arrivals};
use crate::config::ShiftConfig;
use crate::crew::{crew_manager, crew_profiles};
use crate::facility::Facility;
use crate::gate::RoundGates;
use crate::handoff::build_handoff;
use crate::observer::{NoopObserver, ShiftObserver, replay};
use crate::pipeline::truck_round;
use crate::result::{Productivity, RoundSummary, ShiftInput, ShiftResult};
use crate::samplers::Samplers;
use crate::{EngineResult, ShiftError};

/// Run one shift.  `seed = None` draws a seed from OS entropy; the seed used
/// is echoed in the result.
pub fn run_shift(
    total_boxes: u32,
    boxes_for_pick: u32,
    cfg: &ShiftConfig,
    seed: Option<u64>,
) -> EngineResult<ShiftResult> {
    run_shift_with(total_boxes, boxes_for_pick, cfg, seed, &mut NoopObserver)
}

/// [`run_shift`] with an observer replayed once the clock stops.
pub fn run_shift_with<O: ShiftObserver + ?Sized>(
    total_boxes: u32,
    boxes_for_pick: u32,
    cfg: &ShiftConfig,
    seed: Option<u64>,
    observer: &mut O,
) -> EngineResult<ShiftResult> {
    cfg.validate()?;
    let samplers = Samplers::new(&cfg.distributions, &cfg.times)?;
    let seed = seed.unwrap_or_else(ShiftRng::entropy_seed);
    let mut rng = ShiftRng::new(seed);

    let pallets = generate_pallets(total_boxes, boxes_for_pick, &cfg.pallets, &mut rng)?;
    let plan = build_plan(&pallets, &cfg.planner, &samplers.truck_capacity, &mut rng)?;
    let arrivals = plan_arrivals(&cfg.adhoc, &samplers, cfg.window.duration(), &mut rng);
    info!(
        seed,
        total_boxes,
        boxes_for_pick,
        pallets = pallets.len(),
        rounds = plan.rounds.len(),
        adhoc = arrivals.len(),
        start = %cfg.window.label(SimTime::ZERO),
        "night shift starting"
    );

    let mut sim = Sim::new();
    let fac = Rc::new(Facility::new(sim.env(), cfg, samplers, rng));
    let gates = Rc::new(RoundGates::new(plan.rounds.iter().map(|r| (r.round, r.trucks.len() as u32))));

    if !cfg.crew_schedule.is_empty() {
        sim.spawn(crew_manager(Rc::clone(&fac), cfg.clone()));
    }
    for assignment in plan.assignments() {
        sim.spawn(truck_round(Rc::clone(&fac), Rc::clone(&gates), assignment.clone()));
    }
    for arrival in arrivals {
        sim.spawn(adhoc_truck(Rc::clone(&fac), arrival, cfg.adhoc.yard_units));
    }

    sim.run();
    let live = sim.live_processes();
    if live > 0 {
        return Err(ShiftError::Stalled { live, at: sim.now() });
    }

    let operations = fac.take_log();
    let mut trucks = fac.take_trucks();
    trucks.sort_by(|a, b| a.end.cmp(&b.end).then(a.round.cmp(&b.round)).then_with(|| a.truck.cmp(&b.truck)));
    let adhoc = fac.take_adhoc();

    let real_end = trucks
        .iter()
        .map(|t| t.end)
        .chain(adhoc.iter().map(|v| v.departed))
        .fold(operations.last_end(), SimTime::max);
    let nominal_end = cfg.window.nominal_end();
    let horizon = real_end.max(nominal_end);

    let rounds = RoundSummary::collect(&trucks, &gates);
    let picked_boxes: u64 = trucks.iter().map(|t| t.mixed_boxes).sum();
    let handoff = build_handoff(&plan, &trucks, &cfg.window);
    let result = ShiftResult {
        input: ShiftInput { total_boxes, boxes_for_pick, seed, config: cfg.clone() },
        pallets: PalletSummary::of(&pallets),
        fleet: FleetReuse::of(&plan),
        plan,
        rounds,
        trucks,
        adhoc,
        stats: StatsReport::from_records(operations.iter()),
        utilization: utilization(operations.iter(), &crew_profiles(cfg), horizon),
        productivity: Productivity::new(picked_boxes, cfg.crew.pickers, cfg.effective_hours),
        operations,
        yard_trace: fac.yard.trace(),
        nominal_end,
        real_end,
        overrun: real_end.since(nominal_end).max(0.0),
        handoff,
    };
    info!(
        real_end = %cfg.wall_label(result.real_end),
        overrun = result.overrun,
        operations = result.operations.len(),
        en_route = result.handoff.trucks_en_route.len(),
        staged = result.handoff.staged_pallets(),
        "night shift finished"
    );

    replay(&result, observer);
    Ok(result)
}

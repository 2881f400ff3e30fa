//! Unit and scenario tests for dc-shift.

use std::cell::Cell;
use std::rc::Rc;

use dc_core::{PalletCategory, RoundNo, SimTime, TruckId};
use dc_des::Sim;
use dc_metrics::{OpLabel, Station};
use dc_plan::{Pallet, RoundMode};

use crate::{
    CrewOverride, LimitedBy, LunchBreak, NoopObserver, PRIORITY_HIGH, PRIORITY_LOW, PlacementPriority,
    Productivity, ReplicationSummary, RoundGate, RoundGates, ShiftConfig, ShiftError,
    ShiftHandoffState, ShiftObserver, ShiftResult, StagedLoad, Yard, crew_profiles, run_day_shift,
    run_full_cycle, run_replications, run_shift, run_shift_with, select_for_capacity,
};

fn quiet() -> ShiftConfig {
    let mut cfg = ShiftConfig::default();
    cfg.adhoc.enabled = false;
    cfg
}

fn pallet(seq: u32, boxes: u32) -> Pallet {
    Pallet::new(PalletCategory::Mixed, seq, boxes)
}

#[cfg(test)]
mod gate_tests {
    use super::*;

    #[test]
    fn fires_once_at_target() {
        let gate = RoundGate::new(RoundNo(2), 2);
        assert!(!gate.signal_arrival(SimTime(1.0)));
        assert!(!gate.is_complete());
        assert!(gate.signal_arrival(SimTime(4.0)));
        assert!(!gate.signal_arrival(SimTime(9.0)));
        assert!(!gate.signal_arrival(SimTime(12.0)));
        assert_eq!(gate.completion_time(), Some(SimTime(4.0)));
        assert_eq!(gate.arrivals(), 4);
    }

    #[test]
    fn simultaneous_arrivals_are_each_counted() {
        let mut sim = Sim::new();
        let env = sim.env();
        let gates = Rc::new(RoundGates::new([(RoundNo(2), 3)]));
        for _ in 0..3 {
            let (gates, env) = (Rc::clone(&gates), env.clone());
            sim.spawn(async move {
                env.timeout(4.0).await;
                gates.arrive(RoundNo(2), env.now());
            });
        }
        sim.run();
        let gate = gates.gate(RoundNo(2)).unwrap();
        assert_eq!(gate.arrivals(), gate.target());
        assert_eq!(gate.completion_time(), Some(SimTime(4.0)));
    }

    #[test]
    fn empty_round_is_already_complete() {
        let gate = RoundGate::new(RoundNo(3), 0);
        assert!(gate.is_complete());
        assert_eq!(gate.completion_time(), Some(SimTime::ZERO));
    }

    #[test]
    fn round_one_completion_demotes_placements() {
        let gates = RoundGates::new([(RoundNo(1), 2), (RoundNo(2), 1)]);
        assert_eq!(gates.placement_state(), PlacementPriority::Active);
        assert_eq!(gates.placement_priority(), PRIORITY_HIGH);
        gates.arrive(RoundNo(1), SimTime(3.0));
        assert_eq!(gates.placement_priority(), PRIORITY_HIGH);
        gates.arrive(RoundNo(2), SimTime(3.5));
        assert_eq!(gates.placement_priority(), PRIORITY_HIGH);
        gates.arrive(RoundNo(1), SimTime(5.0));
        assert_eq!(gates.placement_state(), PlacementPriority::Demoted);
        assert_eq!(gates.placement_priority(), PRIORITY_LOW);
        // Extra arrivals are ignored rather than demoting again.
        gates.arrive(RoundNo(1), SimTime(6.0));
        assert_eq!(gates.completion_time(RoundNo(1)), Some(SimTime(5.0)));
    }

    #[test]
    fn round_zero_and_unknown_rounds_never_block() {
        let mut sim = Sim::new();
        let env = sim.env();
        let gates = Rc::new(RoundGates::new([(RoundNo(1), 1)]));
        let passed = Rc::new(Cell::new(0));
        for round in [RoundNo::NONE, RoundNo(7)] {
            let (gates, passed, env) = (Rc::clone(&gates), Rc::clone(&passed), env.clone());
            sim.spawn(async move {
                gates.wait(round).await;
                assert_eq!(env.now(), SimTime::ZERO);
                passed.set(passed.get() + 1);
            });
        }
        sim.run();
        assert_eq!(passed.get(), 2);
        assert_eq!(gates.gates().count(), 1);
    }

    #[test]
    fn later_round_waits_for_the_gate() {
        let mut sim = Sim::new();
        let env = sim.env();
        let gates = Rc::new(RoundGates::new([(RoundNo(1), 1), (RoundNo(2), 1)]));
        let released = Rc::new(Cell::new(None));
        {
            let (gates, released, env) = (Rc::clone(&gates), Rc::clone(&released), env.clone());
            sim.spawn(async move {
                gates.wait(RoundNo(1)).await;
                released.set(Some(env.now()));
            });
        }
        {
            let (gates, env) = (Rc::clone(&gates), env.clone());
            sim.spawn(async move {
                env.timeout(8.0).await;
                gates.arrive(RoundNo(1), env.now());
            });
        }
        sim.run();
        assert_eq!(released.get(), Some(SimTime(8.0)));
    }
}

#[cfg(test)]
mod yard_tests {
    use super::*;

    #[test]
    fn permits_block_and_release_on_drop() {
        let mut sim = Sim::new();
        let env = sim.env();
        let yard = Yard::new(3);
        for hold in [5.0, 1.0] {
            let (yard, env) = (yard.clone(), env.clone());
            sim.spawn(async move {
                let truck = TruckId::from("T1-0001");
                let _permit = yard.enter(&env, &truck, 2).await;
                env.timeout(hold).await;
            });
        }
        sim.run();
        let trace = yard.trace();
        let deltas: Vec<i32> = trace.iter().map(|e| e.delta).collect();
        let levels: Vec<u32> = trace.iter().map(|e| e.available).collect();
        assert_eq!(deltas, vec![-2, 2, -2, 2]);
        assert_eq!(levels, vec![1, 3, 1, 3]);
        assert_eq!(trace[2].at, SimTime(5.0));
        assert_eq!(trace[3].at, SimTime(6.0));
        assert_eq!(yard.available(), 3);
    }
}

#[cfg(test)]
mod fusion_tests {
    use super::*;

    #[test]
    fn keeps_largest_first_and_skips_what_does_not_fit() {
        let pallets = [pallet(1, 20), pallet(2, 50), pallet(3, 30), pallet(4, 40)];
        let f = select_for_capacity(&pallets, 75, 10);
        let kept: Vec<u32> = f.kept.iter().map(|p| p.boxes).collect();
        assert_eq!(kept, vec![50, 20]);
        assert_eq!(f.merged.len(), 2);
        assert_eq!(f.limited_by, LimitedBy::Boxes);
    }

    #[test]
    fn pallet_count_limit() {
        let pallets = [pallet(1, 20), pallet(2, 50), pallet(3, 30), pallet(4, 40)];
        let f = select_for_capacity(&pallets, 1_000, 2);
        let kept: Vec<u32> = f.kept.iter().map(|p| p.boxes).collect();
        assert_eq!(kept, vec![50, 40]);
        assert_eq!(f.limited_by, LimitedBy::Pallets);
    }

    #[test]
    fn everything_fits() {
        let pallets = [pallet(1, 20), pallet(2, 30)];
        let f = select_for_capacity(&pallets, 50, 2);
        assert_eq!(f.kept.len(), 2);
        assert!(f.merged.is_empty());
        assert_eq!(f.limited_by, LimitedBy::None);
    }

    #[test]
    fn nothing_fits() {
        let f = select_for_capacity(&[pallet(1, 80)], 50, 4);
        assert!(f.kept.is_empty());
        assert_eq!(f.merged.len(), 1);
        assert!(select_for_capacity(&[pallet(1, 10)], 100, 0).kept.is_empty());
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ShiftConfig::default().validate().unwrap();
        ShiftConfig::day().validate().unwrap();
    }

    #[test]
    fn zero_crew_is_rejected() {
        let mut cfg = ShiftConfig::default();
        cfg.crew.cranes = 0;
        assert!(matches!(cfg.validate(), Err(ShiftError::Config(_))));

        let mut cfg = ShiftConfig::default();
        cfg.crew_schedule.push(crate::CrewChange {
            at_min: 120.0,
            crew:   CrewOverride { checkers: Some(0), ..CrewOverride::default() },
        });
        assert!(matches!(cfg.validate(), Err(ShiftError::Config(_))));
    }

    #[test]
    fn inverted_window_and_bad_inputs_fail_before_the_clock() {
        let mut cfg = quiet();
        cfg.window.end_min = cfg.window.start_min;
        assert!(matches!(run_shift(1_000, 500, &cfg, Some(1)), Err(ShiftError::Core(_))));
        assert!(matches!(run_shift(0, 0, &quiet(), Some(1)), Err(ShiftError::Core(_))));
        assert!(matches!(run_shift(100, 200, &quiet(), Some(1)), Err(ShiftError::Core(_))));
    }

    #[test]
    fn adhoc_trucks_must_fit_the_yard() {
        let mut cfg = ShiftConfig::default();
        cfg.yard_capacity = 1;
        assert!(cfg.validate().is_err());
        cfg.adhoc.enabled = false;
        cfg.validate().unwrap();
    }

    #[test]
    fn json_round_trip_and_partial_override() {
        let cfg = ShiftConfig::day();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ShiftConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.crew, cfg.crew);
        assert_eq!(back.crew_schedule.len(), 2);
        assert_eq!(back.crew_schedule[1].crew, cfg.crew_schedule[1].crew);
        assert_eq!(back.yard_capacity, 4);
        assert_eq!(back.adhoc, cfg.adhoc);

        let partial: ShiftConfig =
            serde_json::from_str(r#"{ "yard_capacity": 8, "crew": { "pickers": 10 } }"#).unwrap();
        assert_eq!(partial.yard_capacity, 8);
        assert_eq!(partial.crew.pickers, 10);
        assert_eq!(partial.crew.cranes, 5);
        assert_eq!(partial.window, ShiftConfig::default().window);
    }

    #[test]
    fn lunch_offsets_only_later_instants() {
        let cfg = ShiftConfig::default();
        assert_eq!(cfg.wall_clock(SimTime(100.0)), SimTime(100.0));
        assert_eq!(cfg.wall_clock(SimTime(150.0)), SimTime(180.0));
        assert_eq!(cfg.wall_label(SimTime(200.0)), cfg.window.label(SimTime(230.0)));
        assert_eq!(ShiftConfig::day().wall_clock(SimTime(500.0)), SimTime(500.0));

        let no_lunch: ShiftConfig = serde_json::from_str(r#"{ "lunch": null }"#).unwrap();
        assert_eq!(no_lunch.wall_clock(SimTime(300.0)), SimTime(300.0));

        let mut bad = ShiftConfig::default();
        bad.lunch = Some(LunchBreak { start_min: 150.0, duration_min: -5.0 });
        assert!(matches!(bad.validate(), Err(ShiftError::Config(_))));
    }

    #[test]
    fn peak_crew_spans_the_schedule() {
        let cfg = ShiftConfig::day();
        assert_eq!(cfg.peak_crew(Station::Crane), 5);
        assert_eq!(cfg.peak_crew(Station::Checker), 2);
        assert_eq!(cfg.peak_crew(Station::Yard), 0);
    }
}

#[cfg(test)]
mod crew_tests {
    use super::*;

    #[test]
    fn day_profiles_follow_the_two_blocks() {
        let profiles = crew_profiles(&ShiftConfig::day());
        let crane = &profiles[&Station::Crane];
        assert_eq!(crane.capacity_at(SimTime::ZERO), 4);
        assert_eq!(crane.capacity_at(SimTime(480.0)), 2);
        assert_eq!(profiles[&Station::Checker].capacity_at(SimTime(500.0)), 1);
        assert_eq!(profiles[&Station::Picker].capacity_at(SimTime(500.0)), 14);
        assert_eq!(profiles[&Station::Yard].capacity_at(SimTime(500.0)), 4);
    }

    #[test]
    fn idle_day_utilization_integrates_the_schedule() {
        let mut cfg = ShiftConfig::day();
        cfg.adhoc.enabled = false;
        let day = run_day_shift(&ShiftHandoffState::default(), &cfg, Some(3)).unwrap();
        assert_eq!(day.end, SimTime(960.0));
        assert!(day.operations.is_empty());
        let crane = day.utilization.station(Station::Crane);
        assert!((crane.available - (4.0 * 480.0 + 2.0 * 480.0)).abs() < 1e-9);
        assert_eq!(crane.busy, 0.0);
    }
}

#[cfg(test)]
mod night_tests {
    use super::*;

    fn night(seed: u64) -> ShiftResult {
        run_shift(20_000, 15_000, &ShiftConfig::default(), Some(seed)).unwrap()
    }

    #[test]
    fn pallets_conserve_boxes_by_category() {
        let r = night(11);
        assert_eq!(r.pallets.mixed_boxes, 15_000);
        assert_eq!(r.pallets.complete_boxes, 5_000);
        let planned: u64 = r.plan.planned_boxes();
        let unassigned: u64 = r.plan.unassigned.iter().map(|p| u64::from(p.boxes)).sum();
        assert_eq!(planned + unassigned, 20_000);
        assert_eq!(r.plan.planned_pallets() + r.plan.unassigned.len(), r.pallets.total_pallets() as usize);
    }

    #[test]
    fn round_one_picks_before_it_ends_and_overrun_is_clamped() {
        let r = night(12);
        let r1 = r.round(RoundNo::FIRST).unwrap();
        assert!(r1.pick_end.unwrap() <= r1.operational_end);
        assert!(r.overrun >= 0.0);
        assert_eq!(r.overrun, r.real_end.since(r.nominal_end).max(0.0));
        assert!(r.real_end >= r1.operational_end);
    }

    #[test]
    fn later_rounds_never_start_before_the_previous_gate() {
        let r = night(13);
        assert!(r.rounds.len() >= 2, "expected staging rounds for 20k boxes");
        for summary in r.rounds.iter().filter(|s| s.round.0 >= 2) {
            let gate = r.round(summary.round.previous()).and_then(|p| p.pick_end).unwrap();
            for t in r.trucks.iter().filter(|t| t.round == summary.round) {
                assert!(t.start >= gate);
            }
            for op in r.operations.iter().filter(|o| o.round == summary.round) {
                assert!(op.start >= gate, "{} started before gate", op.label);
            }
        }
    }

    #[test]
    fn yard_stays_within_capacity() {
        let r = night(14);
        let capacity = r.input.config.yard_capacity;
        assert!(!r.yard_trace.is_empty());
        assert!(r.yard_trace.iter().all(|e| e.available <= capacity));
        assert_eq!(r.yard_trace.iter().map(|e| e.delta).sum::<i32>(), 0);
    }

    #[test]
    fn loaded_trucks_respect_sampled_capacity() {
        let r = night(15);
        for t in r.trucks.iter().filter(|t| t.mode == RoundMode::Loading) {
            let cap = t.capacity.as_ref().unwrap();
            assert!(t.boxes_post <= u64::from(cap.box_capacity));
            assert!(t.pallets_post <= cap.pallet_capacity);
            assert_eq!(t.merged, t.pallets_pre - t.pallets_post);
            assert_eq!(cap.limited_by == LimitedBy::None, t.merged == 0);
            assert_eq!(cap.checked_pallets, t.pallets_pre);
        }
    }

    #[test]
    fn staging_rounds_use_no_yard_and_no_checks() {
        let r = night(16);
        for op in r.operations.iter().filter(|o| o.round.0 >= 2) {
            assert!(matches!(op.label, OpLabel::Pick | OpLabel::StageMixed | OpLabel::StageComplete));
        }
        let staged: usize = r
            .rounds
            .iter()
            .filter(|s| s.mode == RoundMode::Staging)
            .map(|s| s.pallets_pre as usize)
            .sum();
        let stage_ops = r.operations.by_label(OpLabel::StageMixed).count()
            + r.operations.by_label(OpLabel::StageComplete).count();
        assert_eq!(stage_ops, staged);
        assert_eq!(r.handoff.staged_pallets(), staged);
    }

    #[test]
    fn same_seed_same_result() {
        let a = run_shift(6_000, 4_000, &ShiftConfig::default(), Some(99)).unwrap();
        let b = run_shift(6_000, 4_000, &ShiftConfig::default(), Some(99)).unwrap();
        assert_eq!(a.operations, b.operations);
        assert_eq!(a, b);
    }

    #[test]
    fn no_adhoc_arrivals_leave_the_yard_to_round_trucks() {
        let r = run_shift(6_000, 4_000, &quiet(), Some(5)).unwrap();
        assert!(r.adhoc.is_empty());
        assert_eq!(r.operations.by_label(OpLabel::GateIn).count(), 0);
        assert!(r.yard_trace.iter().all(|e| e.delta.abs() == 1));

        let mut capped = ShiftConfig::default();
        capped.adhoc.max_per_shift = 0;
        let r = run_shift(6_000, 4_000, &capped, Some(5)).unwrap();
        assert!(r.adhoc.is_empty());
    }

    #[test]
    fn adhoc_trucks_hold_two_units() {
        let mut cfg = ShiftConfig::default();
        cfg.distributions.adhoc_count.gamma = 5.0;
        let r = run_shift(3_000, 2_000, &cfg, Some(8)).unwrap();
        assert!(!r.adhoc.is_empty());
        for visit in &r.adhoc {
            assert!(visit.truck.as_str().starts_with("T1-"));
            assert!(visit.yard_in >= visit.arrival);
            assert!(visit.departed >= visit.yard_in);
        }
        let stays = r.operations.by_label(OpLabel::YardStay).filter(|o| o.round == RoundNo::NONE);
        assert!(stays.into_iter().all(|o| o.units == 2));
    }

    #[test]
    fn all_complete_truck_skips_picking() {
        let r = run_shift(100, 0, &quiet(), Some(21)).unwrap();
        assert_eq!(r.trucks.len(), 1);
        let t = &r.trucks[0];
        assert_eq!(t.mixed_pallets, 0);
        assert_eq!(t.pick_end, t.start);
        assert_eq!(r.operations.by_label(OpLabel::Pick).count(), 0);
        let r1 = r.round(RoundNo::FIRST).unwrap();
        assert_eq!(r1.trucks, 1);
        assert_eq!(r1.pick_end, Some(t.pick_end));
    }

    #[test]
    fn all_complete_staging_trucks_arrive_once_each() {
        let mut cfg = quiet();
        cfg.planner.max_trucks = 3;
        let r = run_shift(20_000, 0, &cfg, Some(22)).unwrap();
        assert!(r.rounds.iter().any(|s| s.mode == RoundMode::Staging && s.trucks > 1));
        for summary in &r.rounds {
            assert_eq!(summary.pick_arrivals, summary.trucks, "round {}", summary.round);
            assert!(summary.pick_end.is_some());
        }
        assert!(r.trucks.iter().all(|t| t.pick_end == t.start));
        assert_eq!(r.operations.by_label(OpLabel::Pick).count(), 0);
    }

    #[test]
    fn handoff_lists_round_one_trucks_by_return() {
        let r = night(17);
        let round1 = r.round(RoundNo::FIRST).unwrap().trucks as usize;
        assert_eq!(r.handoff.trucks_en_route.len(), round1);
        assert_eq!(r.handoff.return_schedule.len(), round1);
        for pair in r.handoff.return_schedule.windows(2) {
            assert!(pair[0].eta_min <= pair[1].eta_min);
        }
        for t in &r.handoff.trucks_en_route {
            assert!(t.estimated_return_min.unwrap() >= t.departed_at_min + 60.0);
        }
        let pending: usize = r.handoff.pending_round_work.iter().map(|p| p.trucks.len()).sum();
        assert_eq!(pending, r.handoff.staged_pallets_ready.len());
    }

    #[test]
    fn productivity_divides_by_picker_hours() {
        let p = Productivity::new(14_200, 14, 7.1);
        assert!((p.boxes_per_picker_hour - 142.857_142_857).abs() < 1e-6);
        assert_eq!(Productivity::new(10, 0, 7.1).boxes_per_picker_hour, 0.0);
    }

    #[test]
    fn stall_error_names_the_waiters() {
        let e = ShiftError::Stalled { live: 3, at: SimTime(12.0) };
        assert!(e.to_string().contains("3 process"));
    }
}

#[cfg(test)]
mod observer_tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        operations: usize,
        trucks:     usize,
        rounds:     usize,
        ends:       usize,
    }

    impl ShiftObserver for Counter {
        fn on_operation(&mut self, _record: &dc_metrics::OperationRecord) {
            self.operations += 1;
        }
        fn on_truck(&mut self, _truck: &crate::TruckSummary) {
            self.trucks += 1;
        }
        fn on_round(&mut self, _round: &crate::RoundSummary) {
            self.rounds += 1;
        }
        fn on_shift_end(&mut self, _result: &ShiftResult) {
            self.ends += 1;
        }
    }

    #[test]
    fn every_record_is_replayed_once() {
        let mut counter = Counter::default();
        let r = run_shift_with(6_000, 4_000, &quiet(), Some(4), &mut counter).unwrap();
        assert_eq!(counter.operations, r.operations.len());
        assert_eq!(counter.trucks, r.trucks.len());
        assert_eq!(counter.rounds, r.rounds.len());
        assert_eq!(counter.ends, 1);
        run_shift_with(1_000, 500, &quiet(), Some(4), &mut NoopObserver).unwrap();
    }
}

#[cfg(test)]
mod day_tests {
    use super::*;

    fn day_cfg() -> ShiftConfig {
        let mut cfg = ShiftConfig::day();
        cfg.adhoc.enabled = false;
        cfg
    }

    #[test]
    fn staged_lot_is_checked_loaded_and_sent() {
        let handoff = ShiftHandoffState {
            staged_pallets_ready: vec![StagedLoad {
                truck:        TruckId::from("E44"),
                origin_round: RoundNo(2),
                pallets:      vec![pallet(1, 30), pallet(2, 40)],
                boxes:        70,
                ready_at_min: 200.0,
            }],
            ..ShiftHandoffState::default()
        };
        let day = run_day_shift(&handoff, &day_cfg(), Some(2)).unwrap();
        assert_eq!(day.pallets_checked, 2);
        assert_eq!(day.loads.len(), 1);
        assert_eq!(day.unfinished_lots, 0);
        let load = &day.loads[0];
        assert!(load.checked >= load.ready);
        assert!(load.loaded >= load.checked);
        assert_eq!(day.departures.len(), 1);
        assert_eq!(day.departures[0].boxes, 70);
        assert!(day.departures[0].at_min >= 480.0);
        assert_eq!(day.operations.by_label(OpLabel::DayLoad).count(), 2);
        assert_eq!(day.returns.len(), 1);
        assert!(day.returns[0].at_min >= day.departures[0].at_min + 60.0);
    }

    #[test]
    fn full_cycle_consumes_the_night_handoff() {
        let (night_cfg, day_cfg) = (ShiftConfig::default(), ShiftConfig::day());
        let cycle = run_full_cycle(20_000, 15_000, &night_cfg, &day_cfg, Some(31)).unwrap();
        let (night, day) = (&cycle.night, &cycle.day);
        assert_eq!(day.staged_pallets, night.handoff.staged_pallets());
        assert!(day.pallets_checked as usize <= day.staged_pallets);
        assert!(day.departures.len() <= night.handoff.staged_pallets_ready.len());
        assert!(day.departures.iter().all(|d| d.at_min >= 480.0 && d.at_min <= 1_440.0));
        assert!(day.yard_trace.iter().all(|e| e.available <= day.config.yard_capacity));

        let again = run_full_cycle(20_000, 15_000, &night_cfg, &day_cfg, Some(31)).unwrap();
        assert_eq!(again, cycle);
    }
}

#[cfg(test)]
mod replication_tests {
    use super::*;

    #[test]
    fn one_result_per_seed_in_order() {
        let results = run_replications(3_000, 2_000, &quiet(), &[1, 2, 3]).unwrap();
        let seeds: Vec<u64> = results.iter().map(|r| r.input.seed).collect();
        assert_eq!(seeds, vec![1, 2, 3]);
        let summary = ReplicationSummary::of(&results);
        assert_eq!(summary.runs, 3);
        assert!(summary.max_real_end >= summary.mean_real_end);
        assert_eq!(ReplicationSummary::of(&[]), ReplicationSummary::default());
    }
}

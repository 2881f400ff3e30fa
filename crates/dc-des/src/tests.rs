//! Integration tests for dc-des.

use std::cell::RefCell;
use std::rc::Rc;

use dc_core::SimTime;

use crate::{Container, Env, Resource, Signal, Sim, Store};

// ── Helpers ───────────────────────────────────────────────────────────────────

type Log = Rc<RefCell<Vec<(String, f64)>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn record(log: &Log, env: &Env, what: &str) {
    log.borrow_mut().push((what.to_owned(), env.now().minutes()));
}

fn entries(log: &Log) -> Vec<(String, f64)> {
    log.borrow().clone()
}

fn names(log: &Log) -> Vec<String> {
    log.borrow().iter().map(|(n, _)| n.clone()).collect()
}

/// Hold `resource` for `hold` minutes after an initial `delay`, logging the
/// instant the slot was granted.
fn holder(env: &Env, log: &Log, resource: &Resource, name: &str, delay: f64, priority: i32, hold: f64) {
    let (env, log, resource, name) = (env.clone(), log.clone(), resource.clone(), name.to_owned());
    env.clone().spawn(async move {
        env.timeout(delay).await;
        let _slot = resource.acquire_with_priority(priority).await;
        record(&log, &env, &name);
        env.timeout(hold).await;
    });
}

// ── Clock ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod clock_tests {
    use super::*;

    #[test]
    fn timeouts_advance_the_clock() {
        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let l2 = l.clone();
        sim.spawn(async move {
            env.timeout(5.0).await;
            record(&l2, &env, "a");
            env.timeout(3.0).await;
            record(&l2, &env, "b");
        });
        let end = sim.run();
        assert_eq!(end, SimTime(8.0));
        assert_eq!(entries(&l), vec![("a".into(), 5.0), ("b".into(), 8.0)]);
        assert_eq!(sim.live_processes(), 0);
    }

    #[test]
    fn same_instant_resolves_in_scheduling_order() {
        let mut sim = Sim::new();
        let l = log();
        for name in ["first", "second", "third"] {
            let env = sim.env();
            let l = l.clone();
            sim.spawn(async move {
                env.timeout(1.0).await;
                record(&l, &env, name);
            });
        }
        sim.run();
        assert_eq!(names(&l), ["first", "second", "third"]);
    }

    #[test]
    fn wake_queues_behind_timers_already_due() {
        let mut sim = Sim::new();
        let l = log();
        let signal = Signal::new();
        {
            let (env, l, signal) = (sim.env(), l.clone(), signal.clone());
            sim.spawn(async move {
                env.timeout(1.0).await;
                record(&l, &env, "A");
                signal.fire(env.now());
            });
        }
        {
            let (env, l, signal) = (sim.env(), l.clone(), signal.clone());
            sim.spawn(async move {
                signal.wait().await;
                record(&l, &env, "B");
            });
        }
        {
            let (env, l) = (sim.env(), l.clone());
            sim.spawn(async move {
                env.timeout(1.0).await;
                record(&l, &env, "C");
            });
        }
        sim.run();
        assert_eq!(entries(&l), vec![("A".into(), 1.0), ("C".into(), 1.0), ("B".into(), 1.0)]);
    }

    #[test]
    fn wake_runs_before_timers_scheduled_after_it() {
        let mut sim = Sim::new();
        let l = log();
        let signal = Signal::new();
        {
            let (env, l, signal) = (sim.env(), l.clone(), signal.clone());
            sim.spawn(async move {
                env.timeout(1.0).await;
                signal.fire(env.now());
                env.timeout(0.0).await;
                record(&l, &env, "A-yield");
            });
        }
        {
            let (env, l, signal) = (sim.env(), l.clone(), signal.clone());
            sim.spawn(async move {
                signal.wait().await;
                record(&l, &env, "B");
            });
        }
        sim.run();
        assert_eq!(names(&l), ["B", "A-yield"]);
    }

    #[test]
    fn zero_timeout_yields_to_ready_processes() {
        let mut sim = Sim::new();
        let l = log();
        let (env_a, l_a) = (sim.env(), l.clone());
        sim.spawn(async move {
            env_a.timeout(0.0).await;
            record(&l_a, &env_a, "a-after-yield");
        });
        let (env_b, l_b) = (sim.env(), l.clone());
        sim.spawn(async move {
            record(&l_b, &env_b, "b");
        });
        sim.run();
        assert_eq!(names(&l), ["b", "a-after-yield"]);
    }

    #[test]
    fn run_until_stops_and_resumes() {
        let mut sim = Sim::new();
        let l = log();
        for delay in [5.0, 15.0] {
            let env = sim.env();
            let l = l.clone();
            sim.spawn(async move {
                env.timeout(delay).await;
                record(&l, &env, "tick");
            });
        }
        assert_eq!(sim.run_until(SimTime(10.0)), SimTime(10.0));
        assert_eq!(l.borrow().len(), 1);
        assert_eq!(sim.next_event_time(), Some(SimTime(15.0)));
        assert_eq!(sim.run(), SimTime(15.0));
        assert_eq!(l.borrow().len(), 2);
    }

    #[test]
    fn run_until_moves_clock_past_idle_time() {
        let mut sim = Sim::new();
        assert_eq!(sim.run_until(SimTime(42.0)), SimTime(42.0));
    }

    #[test]
    fn join_handles_return_outputs() {
        let mut sim = Sim::new();
        let env = sim.env();
        let out = Rc::new(RefCell::new(Vec::new()));
        let out2 = out.clone();
        sim.spawn(async move {
            let children: Vec<_> = (1..=3u32)
                .map(|i| {
                    let env = env.clone();
                    env.clone().spawn(async move {
                        env.timeout(f64::from(4 - i)).await;
                        i * 10
                    })
                })
                .collect();
            let values = futures::future::join_all(children).await;
            out2.borrow_mut().extend(values);
            out2.borrow_mut().push(env.now().minutes() as u32);
        });
        sim.run();
        assert_eq!(*out.borrow(), vec![10, 20, 30, 3]);
    }

    #[test]
    fn blocked_processes_are_reported() {
        let mut sim = Sim::new();
        let never = Signal::new();
        sim.spawn(async move {
            never.wait().await;
        });
        sim.run();
        assert_eq!(sim.live_processes(), 1);
    }
}

// ── Resource ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod resource_tests {
    use super::*;

    #[test]
    fn fifo_service_order() {
        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let r = Resource::new("picker", 1);
        for name in ["a", "b", "c"] {
            holder(&env, &l, &r, name, 0.0, 0, 2.0);
        }
        sim.run();
        assert_eq!(entries(&l), vec![("a".into(), 0.0), ("b".into(), 2.0), ("c".into(), 4.0)]);
        assert_eq!(r.in_use(), 0);
        assert_eq!(r.grants(), 3);
    }

    #[test]
    fn lower_priority_value_served_first() {
        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let crane = Resource::new("crane", 1);
        holder(&env, &l, &crane, "holder", 0.0, 0, 5.0);
        holder(&env, &l, &crane, "low", 1.0, 1, 1.0);
        holder(&env, &l, &crane, "high", 2.0, 0, 1.0);
        sim.run();
        assert_eq!(
            entries(&l),
            vec![("holder".into(), 0.0), ("high".into(), 5.0), ("low".into(), 6.0)]
        );
    }

    #[test]
    fn equal_priority_is_fifo() {
        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let crane = Resource::new("crane", 1);
        holder(&env, &l, &crane, "holder", 0.0, 0, 5.0);
        holder(&env, &l, &crane, "x", 1.0, 1, 1.0);
        holder(&env, &l, &crane, "y", 2.0, 1, 1.0);
        sim.run();
        assert_eq!(names(&l), ["holder", "x", "y"]);
    }

    #[test]
    fn guard_released_on_early_return() {
        async fn bail(env: Env, r: Resource, fail: bool) -> Result<(), &'static str> {
            let _slot = r.acquire().await;
            env.timeout(1.0).await;
            if fail {
                return Err("defect");
            }
            env.timeout(100.0).await;
            Ok(())
        }

        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let r = Resource::new("checker", 1);
        sim.spawn(bail(env.clone(), r.clone(), true));
        holder(&env, &l, &r, "next", 0.0, 0, 1.0);
        sim.run();
        assert_eq!(entries(&l), vec![("next".into(), 1.0)]);
    }

    #[test]
    fn capacity_growth_serves_waiters() {
        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let r = Resource::new("crane", 1);
        for name in ["a", "b", "c"] {
            holder(&env, &l, &r, name, 0.0, 0, 10.0);
        }
        let (env2, r2) = (env.clone(), r.clone());
        sim.spawn(async move {
            env2.timeout(1.0).await;
            r2.set_capacity(3);
        });
        sim.run();
        assert_eq!(entries(&l), vec![("a".into(), 0.0), ("b".into(), 1.0), ("c".into(), 1.0)]);
    }

    #[test]
    fn capacity_shrink_does_not_preempt() {
        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let r = Resource::new("crane", 2);
        holder(&env, &l, &r, "a", 0.0, 0, 10.0);
        holder(&env, &l, &r, "b", 0.0, 0, 10.0);
        holder(&env, &l, &r, "c", 2.0, 0, 1.0);
        let (env2, r2) = (env.clone(), r.clone());
        sim.spawn(async move {
            env2.timeout(1.0).await;
            r2.set_capacity(1);
        });
        sim.run();
        // c needs both a and b gone before in_use < 1.
        assert_eq!(entries(&l)[2], ("c".into(), 10.0));
        assert_eq!(r.in_use(), 0);
    }

    #[test]
    fn abandoned_request_leaves_the_queue() {
        use futures::future::{Either, select};

        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let r = Resource::new("crane", 1);
        holder(&env, &l, &r, "holder", 0.0, 0, 10.0);

        let (env2, r2, l2) = (env.clone(), r.clone(), l.clone());
        sim.spawn(async move {
            match select(r2.acquire(), env2.timeout(2.0)).await {
                Either::Left(_) => record(&l2, &env2, "impatient-served"),
                Either::Right(_) => record(&l2, &env2, "impatient-gave-up"),
            }
        });
        holder(&env, &l, &r, "patient", 3.0, 0, 1.0);
        sim.run();
        assert_eq!(
            entries(&l),
            vec![
                ("holder".into(), 0.0),
                ("impatient-gave-up".into(), 2.0),
                ("patient".into(), 10.0),
            ]
        );
        assert_eq!(r.queue_len(), 0);
    }
}

// ── Container ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod container_tests {
    use super::*;

    fn taker(env: &Env, log: &Log, c: &Container, name: &str, delay: f64, amount: u32, hold: f64) {
        let (env, log, c, name) = (env.clone(), log.clone(), c.clone(), name.to_owned());
        env.clone().spawn(async move {
            env.timeout(delay).await;
            let _units = c.lease(amount).await;
            record(&log, &env, &name);
            env.timeout(hold).await;
        });
    }

    #[test]
    fn head_of_line_blocks_smaller_requests() {
        let mut sim = Sim::new();
        let env = sim.env();
        let l = log();
        let yard = Container::new("yard", 4);
        taker(&env, &l, &yard, "big", 0.0, 3, 10.0);
        taker(&env, &l, &yard, "two", 1.0, 2, 1.0);
        // One unit is free at t=2 but "two" is ahead in line.
        taker(&env, &l, &yard, "one", 2.0, 1, 1.0);
        sim.run();
        assert_eq!(
            entries(&l),
            vec![("big".into(), 0.0), ("two".into(), 10.0), ("one".into(), 10.0)]
        );
        assert_eq!(yard.level(), 4);
    }

    #[test]
    fn get_and_put_round_trip() {
        let mut sim = Sim::new();
        let env = sim.env();
        let c = Container::new("pool", 5);
        let c2 = c.clone();
        let levels = Rc::new(RefCell::new(Vec::new()));
        let levels2 = levels.clone();
        sim.spawn(async move {
            c2.get(2).await;
            levels2.borrow_mut().push(c2.level());
            env.timeout(1.0).await;
            c2.put(2);
            levels2.borrow_mut().push(c2.level());
        });
        sim.run();
        assert_eq!(*levels.borrow(), vec![3, 5]);
    }

    #[test]
    #[should_panic(expected = "overfilled")]
    fn overfilling_panics() {
        let c = Container::new("yard", 2);
        c.put(1);
    }

    #[test]
    #[should_panic(expected = "can never be served")]
    fn oversized_request_panics() {
        let c = Container::new("yard", 2);
        let _ = c.get(3);
    }
}

// ── Store & Signal ────────────────────────────────────────────────────────────

#[cfg(test)]
mod handoff_tests {
    use super::*;

    #[test]
    fn store_get_waits_for_put() {
        let mut sim = Sim::new();
        let env = sim.env();
        let store: Store<&'static str> = Store::new();
        let l = log();

        let (env_g, store_g, l_g) = (env.clone(), store.clone(), l.clone());
        sim.spawn(async move {
            for _ in 0..2 {
                let item = store_g.get().await;
                record(&l_g, &env_g, item);
            }
        });
        let (env_p, store_p) = (env.clone(), store.clone());
        sim.spawn(async move {
            env_p.timeout(3.0).await;
            store_p.put("first");
            store_p.put("second");
        });
        sim.run();
        assert_eq!(entries(&l), vec![("first".into(), 3.0), ("second".into(), 3.0)]);
        assert!(store.is_empty());
    }

    #[test]
    fn store_serves_getters_in_arrival_order() {
        let mut sim = Sim::new();
        let env = sim.env();
        let store: Store<u32> = Store::new();
        let got = Rc::new(RefCell::new(Vec::new()));
        for worker in 0..3u32 {
            let (store, got) = (store.clone(), got.clone());
            sim.spawn(async move {
                let item = store.get().await;
                got.borrow_mut().push((worker, item));
            });
        }
        let store_p = store.clone();
        sim.spawn(async move {
            env.timeout(1.0).await;
            for item in [100, 200, 300] {
                store_p.put(item);
            }
        });
        sim.run();
        assert_eq!(*got.borrow(), vec![(0, 100), (1, 200), (2, 300)]);
    }

    #[test]
    fn signal_wakes_all_waiters_at_fire_time() {
        let mut sim = Sim::new();
        let env = sim.env();
        let signal = Signal::new();
        let l = log();
        for name in ["w1", "w2"] {
            let (env, signal, l) = (env.clone(), signal.clone(), l.clone());
            sim.spawn(async move {
                let at = signal.wait().await;
                assert_eq!(at, env.now());
                record(&l, &env, name);
            });
        }
        let (env_f, signal_f) = (env.clone(), signal.clone());
        sim.spawn(async move {
            env_f.timeout(7.0).await;
            signal_f.fire(env_f.now());
        });
        sim.run();
        assert_eq!(entries(&l), vec![("w1".into(), 7.0), ("w2".into(), 7.0)]);
        assert_eq!(signal.fired_at(), Some(SimTime(7.0)));
    }

    #[test]
    fn late_waiter_resolves_immediately() {
        let mut sim = Sim::new();
        let env = sim.env();
        let signal = Signal::fired(SimTime::ZERO);
        let l = log();
        let l2 = l.clone();
        sim.spawn(async move {
            env.timeout(4.0).await;
            let at = signal.wait().await;
            assert_eq!(at, SimTime::ZERO);
            record(&l2, &env, "through");
        });
        sim.run();
        assert_eq!(entries(&l), vec![("through".into(), 4.0)]);
    }

    #[test]
    #[should_panic(expected = "signal fired twice")]
    fn double_fire_panics() {
        let s = Signal::new();
        s.fire(SimTime(1.0));
        s.fire(SimTime(2.0));
    }
}

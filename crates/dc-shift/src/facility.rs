//! Shared state of one running shift: crews, yard, RNG and the operation log.
//!
//! Every process holds an `Rc<Facility>`.  `RefCell` borrows are always
//! released before the process suspends.

use std::cell::RefCell;

use dc_core::{PalletId, RoundNo, ShiftRng, SimTime, TruckId};
use dc_des::{Env, Resource};
use dc_metrics::{OpLabel, OperationLog, OperationRecord, Station};
use rand::distributions::Distribution;
use tracing::trace;

use crate::adhoc::AdhocSummary;
use crate::config::{CountRange, CrewSizes, ShiftConfig};
use crate::pipeline::TruckSummary;
use crate::samplers::Samplers;
use crate::yard::Yard;

/// One unit of crew work about to be requested.
#[derive(Clone, Debug)]
pub(crate) struct Op {
    pub label:  OpLabel,
    pub round:  RoundNo,
    pub truck:  TruckId,
    pub pallet: Option<PalletId>,
}

impl Op {
    pub fn new(label: OpLabel, round: RoundNo, truck: &TruckId) -> Self {
        Self { label, round, truck: truck.clone(), pallet: None }
    }

    pub fn pallet(mut self, pallet: PalletId) -> Self {
        self.pallet = Some(pallet);
        self
    }
}

pub(crate) struct Facility {
    pub env:                Env,
    pub pickers:            Resource,
    pub crane:              Resource,
    pub checkers:           Resource,
    pub rack_adjusters:     Resource,
    pub movers:             Resource,
    pub gate:               Resource,
    pub yard:               Yard,
    pub samplers:           Samplers,
    pub defect_probability: f64,
    pub pallet_capacity:    CountRange,
    rng:                    RefCell<ShiftRng>,
    log:                    RefCell<OperationLog>,
    trucks:                 RefCell<Vec<TruckSummary>>,
    adhoc:                  RefCell<Vec<AdhocSummary>>,
}

impl Facility {
    pub fn new(env: Env, cfg: &ShiftConfig, samplers: Samplers, rng: ShiftRng) -> Self {
        let CrewSizes { pickers, cranes, checkers, rack_adjusters, movers, gate_staff } = cfg.crew;
        Self {
            env,
            pickers: Resource::new("pickers", pickers as usize),
            crane: Resource::new("crane", cranes as usize),
            checkers: Resource::new("checkers", checkers as usize),
            rack_adjusters: Resource::new("rack-adjusters", rack_adjusters as usize),
            movers: Resource::new("movers", movers as usize),
            gate: Resource::new("gate", gate_staff as usize),
            yard: Yard::new(cfg.yard_capacity),
            samplers,
            defect_probability: cfg.defect_probability,
            pallet_capacity: cfg.truck_pallet_capacity,
            rng: RefCell::new(rng),
            log: RefCell::new(OperationLog::new()),
            trucks: RefCell::default(),
            adhoc: RefCell::default(),
        }
    }

    /// The crew resource serving `station`.  The yard is a container, not a
    /// crew, and has none.
    pub fn resource(&self, station: Station) -> Option<&Resource> {
        match station {
            Station::Picker => Some(&self.pickers),
            Station::Crane => Some(&self.crane),
            Station::Checker => Some(&self.checkers),
            Station::RackAdjuster => Some(&self.rack_adjusters),
            Station::Mover => Some(&self.movers),
            Station::Gate => Some(&self.gate),
            Station::Yard => None,
        }
    }

    pub fn with_rng<T>(&self, f: impl FnOnce(&mut ShiftRng) -> T) -> T {
        f(&mut self.rng.borrow_mut())
    }

    pub fn sample(&self, dist: &impl Distribution<f64>) -> f64 {
        dist.sample(&mut *self.rng.borrow_mut())
    }

    /// Request the crew serving `op.label`, hold it for a duration drawn from
    /// `dist` once granted, release it and log the usage.
    ///
    /// # Panics
    /// If the label is not served by a crew resource.
    pub async fn perform(&self, op: Op, priority: i32, dist: &impl Distribution<f64>) -> OperationRecord {
        let station = op.label.station();
        let Some(resource) = self.resource(station) else {
            panic!("operation {} has no crew resource", op.label);
        };
        let requested = self.env.now();
        let guard = resource.acquire_with_priority(priority).await;
        let start = self.env.now();
        let minutes = self.sample(dist);
        let end = self.env.timeout(minutes).await;
        drop(guard);

        let mut record = OperationRecord::new(op.label, op.round, op.truck, requested, start, end);
        if let Some(pallet) = op.pallet {
            record = record.with_pallet(pallet);
        }
        self.push(record.clone());
        record
    }

    pub fn push(&self, record: OperationRecord) {
        trace!(
            label = %record.label,
            round = %record.round,
            truck = %record.truck,
            wait = record.wait,
            hold = record.hold,
            "operation"
        );
        self.log.borrow_mut().push(record);
    }

    /// Log a yard occupancy interval.
    pub fn push_stay(&self, round: RoundNo, truck: &TruckId, requested: SimTime, entered: SimTime, units: u32) {
        let record = OperationRecord::new(OpLabel::YardStay, round, truck.clone(), requested, entered, self.env.now())
            .with_units(units);
        self.push(record);
    }

    pub fn push_truck(&self, summary: TruckSummary) {
        self.trucks.borrow_mut().push(summary);
    }

    pub fn push_adhoc(&self, summary: AdhocSummary) {
        self.adhoc.borrow_mut().push(summary);
    }

    pub fn take_log(&self) -> OperationLog {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn take_trucks(&self) -> Vec<TruckSummary> {
        std::mem::take(&mut *self.trucks.borrow_mut())
    }

    pub fn take_adhoc(&self) -> Vec<AdhocSummary> {
        std::mem::take(&mut *self.adhoc.borrow_mut())
    }
}

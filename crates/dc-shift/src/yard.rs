//! Yard equivalent units.
//!
//! A round truck occupies one unit from yard entry until it is ready to
//! depart; an ad-hoc truck occupies two from gate-in to gate-out.  Units are
//! only ever handed out as a [`YardPermit`], which returns them on drop, so
//! every exit path releases the yard.

use std::cell::RefCell;
use std::rc::Rc;

use dc_core::{SimTime, TruckId};
use dc_des::{Container, ContainerLease, Env};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One yard entry or exit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YardEvent {
    pub at:        SimTime,
    pub truck:     TruckId,
    /// Negative on entry, positive on exit.
    pub delta:     i32,
    /// Free units right after the event.
    pub available: u32,
}

#[derive(Clone)]
pub struct Yard {
    units: Container,
    trace: Rc<RefCell<Vec<YardEvent>>>,
}

impl Yard {
    pub fn new(capacity: u32) -> Self {
        Self { units: Container::new("yard", capacity), trace: Rc::default() }
    }

    pub fn capacity(&self) -> u32 {
        self.units.capacity()
    }

    pub fn available(&self) -> u32 {
        self.units.level()
    }

    /// Wait for `units` free units and take them for `truck`.
    ///
    /// # Panics
    /// If `units` exceeds the yard capacity; configuration validation rules
    /// this out before the clock starts.
    pub async fn enter(&self, env: &Env, truck: &TruckId, units: u32) -> YardPermit {
        let lease = self.units.lease(units).await;
        let event = YardEvent {
            at:        env.now(),
            truck:     truck.clone(),
            delta:     -(units as i32),
            available: self.units.level(),
        };
        debug!(truck = %truck, units, available = event.available, t = event.at.minutes(), "yard entry");
        self.trace.borrow_mut().push(event);
        YardPermit { lease, yard: self.clone(), env: env.clone(), truck: truck.clone(), entered: env.now() }
    }

    /// Snapshot of every entry and exit so far.
    pub fn trace(&self) -> Vec<YardEvent> {
        self.trace.borrow().clone()
    }
}

/// Units held by one truck.  Dropping the permit records the exit and
/// returns the units.
pub struct YardPermit {
    lease:   ContainerLease,
    yard:    Yard,
    env:     Env,
    truck:   TruckId,
    entered: SimTime,
}

impl YardPermit {
    pub fn units(&self) -> u32 {
        self.lease.amount()
    }

    pub fn entered(&self) -> SimTime {
        self.entered
    }
}

impl Drop for YardPermit {
    fn drop(&mut self) {
        // The lease field is dropped after this body, so the units are still
        // out at this point.
        let units = self.lease.amount();
        let event = YardEvent {
            at:        self.env.now(),
            truck:     self.truck.clone(),
            delta:     units as i32,
            available: self.yard.units.level() + units,
        };
        debug!(truck = %self.truck, units, available = event.available, t = event.at.minutes(), "yard exit");
        self.yard.trace.borrow_mut().push(event);
    }
}

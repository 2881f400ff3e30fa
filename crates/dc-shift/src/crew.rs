//! Time-of-day crew changes.
//!
//! The crew manager is an ordinary process: it sleeps until each change and
//! resizes the live resources.  The same schedule, folded into
//! [`CapacityProfile`]s, is the denominator of the utilization report.

use std::collections::BTreeMap;
use std::rc::Rc;

use dc_core::SimTime;
use dc_metrics::{CapacityProfile, Station};
use tracing::debug;

use crate::config::{CrewChange, ShiftConfig};
use crate::facility::Facility;

/// Changes in application order.  Equal times keep their configured order.
fn ordered(schedule: &[CrewChange]) -> Vec<CrewChange> {
    let mut changes = schedule.to_vec();
    changes.sort_by(|a, b| a.at_min.total_cmp(&b.at_min));
    changes
}

pub(crate) async fn crew_manager(fac: Rc<Facility>, cfg: ShiftConfig) {
    for change in ordered(&cfg.crew_schedule) {
        fac.env.timeout_until(cfg.window.relative(change.at_min)).await;
        for station in Station::ALL {
            let (Some(size), Some(resource)) = (change.crew.get(station), fac.resource(station)) else {
                continue;
            };
            resource.set_capacity(size as usize);
            debug!(station = %station, size, at = %change.at_clock(), "crew change");
        }
    }
}

/// Capacity over the shift clock for every station, the yard included.
/// Changes scheduled before the shift starts apply from time zero.
pub fn crew_profiles(cfg: &ShiftConfig) -> BTreeMap<Station, CapacityProfile> {
    let mut profiles: BTreeMap<Station, CapacityProfile> = Station::ALL
        .into_iter()
        .filter_map(|s| cfg.crew.get(s).map(|n| (s, CapacityProfile::constant(n))))
        .collect();
    profiles.insert(Station::Yard, CapacityProfile::constant(cfg.yard_capacity));

    for change in ordered(&cfg.crew_schedule) {
        let at = cfg.window.relative(change.at_min).max(SimTime::ZERO);
        for (station, profile) in profiles.iter_mut() {
            if let Some(size) = change.crew.get(*station) {
                profile.set(at, size);
            }
        }
    }
    profiles
}

//! Crew-aware utilization.

use std::collections::BTreeMap;

use dc_core::SimTime;

use crate::{CapacityProfile, OperationRecord, Station};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Utilization {
    /// Slot-minutes spent holding the station inside the horizon.
    pub busy:         f64,
    /// `∫ capacity(t) dt` over the horizon.
    pub available:    f64,
    pub max_capacity: u32,
    pub operations:   u64,
}

impl Utilization {
    /// `busy / available` as a percentage; zero when nothing was available.
    pub fn percent(&self) -> f64 {
        if self.available > 0.0 { self.busy / self.available * 100.0 } else { 0.0 }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UtilizationReport {
    /// End of the integration window; the window starts at zero.
    pub horizon:  SimTime,
    pub stations: BTreeMap<Station, Utilization>,
}

impl UtilizationReport {
    pub fn station(&self, station: Station) -> Utilization {
        self.stations.get(&station).copied().unwrap_or_default()
    }
}

/// Utilization of every profiled station over `[0, horizon]`.
///
/// Busy time is `Σ units × |[start, end] ∩ [0, horizon]|`, so an operation
/// still running at the horizon only counts the part inside it.  Records of
/// stations without a profile are ignored.
pub fn utilization<'a>(
    records:  impl IntoIterator<Item = &'a OperationRecord>,
    profiles: &BTreeMap<Station, CapacityProfile>,
    horizon:  SimTime,
) -> UtilizationReport {
    let mut stations: BTreeMap<Station, Utilization> = profiles
        .iter()
        .map(|(&station, profile)| {
            let u = Utilization {
                available: profile.integral(SimTime::ZERO, horizon),
                max_capacity: profile.max_capacity(),
                ..Utilization::default()
            };
            (station, u)
        })
        .collect();

    for r in records {
        let Some(u) = stations.get_mut(&r.station()) else { continue };
        let lo = r.start.max(SimTime::ZERO);
        let hi = r.end.min(horizon);
        if hi > lo {
            u.busy += f64::from(r.units) * hi.since(lo);
        }
        u.operations += 1;
    }

    UtilizationReport { horizon, stations }
}

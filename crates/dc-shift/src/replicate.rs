//! Independent replications of the night shift.
//!
//! Each replication owns its whole executor, so replications share nothing
//! and can run on Rayon's pool when the `parallel` feature is on.

use serde::{Deserialize, Serialize};

use crate::EngineResult;
use crate::config::ShiftConfig;
use crate::night::run_shift;
use crate::result::ShiftResult;

/// Spread of the headline outcomes across replications.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationSummary {
    pub runs:              usize,
    pub mean_real_end:     f64,
    pub max_real_end:      f64,
    pub mean_overrun:      f64,
    /// Runs that finished after the nominal end.
    pub overrun_runs:      usize,
    pub mean_merged:       f64,
    pub mean_productivity: f64,
}

impl ReplicationSummary {
    pub fn of(results: &[ShiftResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let n = results.len() as f64;
        let mean = |f: fn(&ShiftResult) -> f64| results.iter().map(f).sum::<f64>() / n;
        Self {
            runs:              results.len(),
            mean_real_end:     mean(|r| r.real_end.minutes()),
            max_real_end:      results.iter().map(|r| r.real_end.minutes()).fold(0.0, f64::max),
            mean_overrun:      mean(|r| r.overrun),
            overrun_runs:      results.iter().filter(|r| r.overrun > 0.0).count(),
            mean_merged:       mean(|r| r.rounds.iter().map(|s| f64::from(s.merged)).sum()),
            mean_productivity: mean(|r| r.productivity.boxes_per_picker_hour),
        }
    }
}

/// Run one night shift per seed.  Results come back in seed order; the
/// first failing seed's error is returned.
pub fn run_replications(
    total_boxes: u32,
    boxes_for_pick: u32,
    cfg: &ShiftConfig,
    seeds: &[u64],
) -> EngineResult<Vec<ShiftResult>> {
    #[cfg(not(feature = "parallel"))]
    {
        seeds
            .iter()
            .map(|&seed| run_shift(total_boxes, boxes_for_pick, cfg, Some(seed)))
            .collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        seeds
            .par_iter()
            .map(|&seed| run_shift(total_boxes, boxes_for_pick, cfg, Some(seed)))
            .collect()
    }
}

//! A full 24-hour cycle: the night shift, then the day shift fed by its
//! handoff.

use dc_core::ShiftRng;

use crate::EngineResult;
use crate::config::ShiftConfig;
use crate::day::run_day_shift;
use crate::night::run_shift;
use crate::result::CycleResult;

/// Stream offset of the day shift's seed.
const DAY_STREAM: u64 = 1;

/// Run `night` then `day`.  The day seed is derived from the night seed so
/// one seed reproduces the whole cycle.
pub fn run_full_cycle(
    total_boxes: u32,
    boxes_for_pick: u32,
    night: &ShiftConfig,
    day: &ShiftConfig,
    seed: Option<u64>,
) -> EngineResult<CycleResult> {
    let night = run_shift(total_boxes, boxes_for_pick, night, seed)?;
    let day_seed = ShiftRng::mixed_seed(night.input.seed, DAY_STREAM);
    let day = run_day_shift(&night.handoff, day, Some(day_seed))?;
    Ok(CycleResult { night, day })
}

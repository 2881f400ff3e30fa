//! cycle — one night shift and the day shift that follows it.
//!
//! Runs the default night configuration on 20 000 boxes (15 000 of them
//! picked into mixed pallets), hands the staged work to the day preset, and
//! writes the night's operations, trucks and rounds as CSV plus the whole
//! cycle as JSON.
//!
//! ```text
//! cargo run -p cycle -- [night-config.json]
//! RUST_LOG=dc_shift=debug cargo run -p cycle
//! ```
//!
//! A config file may set any subset of `ShiftConfig`'s fields; the rest keep
//! their defaults.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dc_core::clock_label;
use dc_metrics::Station;
use dc_output::{CsvWriter, ShiftOutputObserver};
use dc_shift::{ShiftConfig, replay, run_full_cycle};

// ── Constants ─────────────────────────────────────────────────────────────────

const TOTAL_BOXES:    u32 = 20_000;
const BOXES_FOR_PICK: u32 = 15_000;
const SEED:           u64 = 42;
const OUTPUT_DIR:     &str = "output/cycle";

fn load_config(path: Option<String>) -> Result<ShiftConfig> {
    let Some(path) = path else {
        return Ok(ShiftConfig::default());
    };
    let file = File::open(&path).with_context(|| format!("opening {path}"))?;
    serde_json::from_reader(file).with_context(|| format!("parsing {path}"))
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let night_cfg = load_config(std::env::args().nth(1))?;
    let day_cfg = ShiftConfig::day();

    println!("=== cycle — distribution-center night + day shift ===");
    println!("Boxes: {TOTAL_BOXES} ({BOXES_FOR_PICK} picked)  |  Seed: {SEED}");
    println!();

    // 1. Run both shifts.
    let t0 = Instant::now();
    let cycle = run_full_cycle(TOTAL_BOXES, BOXES_FOR_PICK, &night_cfg, &day_cfg, Some(SEED))?;
    let elapsed = t0.elapsed();
    let night = &cycle.night;
    let day = &cycle.day;
    let window = night.input.config.window;

    // 2. Night output.
    let night_dir = Path::new(OUTPUT_DIR).join("night");
    let mut obs = ShiftOutputObserver::new(CsvWriter::new(&night_dir)?);
    replay(night, &mut obs);
    if let Some(e) = obs.take_error() {
        eprintln!("output error: {e}");
    }
    let json = BufWriter::new(File::create(Path::new(OUTPUT_DIR).join("cycle.json"))?);
    serde_json::to_writer_pretty(json, &cycle)?;

    // 3. Night summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!(
        "Pallets: {} mixed, {} complete  |  Trucks: {} round-1, {} unique",
        night.pallets.mixed_pallets,
        night.pallets.complete_pallets,
        night.fleet.round1_trucks,
        night.fleet.unique_trucks,
    );
    println!(
        "Night end: {} (nominal {})  |  overrun {:.1} min",
        night_cfg.wall_label(night.real_end),
        window.label(night.nominal_end),
        night.overrun,
    );
    println!(
        "Productivity: {:.1} boxes / picker-hour",
        night.productivity.boxes_per_picker_hour
    );
    println!();

    println!(
        "{:<6} {:<8} {:>6} {:>8} {:>8} {:>7} {:>9} {:>8}",
        "Round", "Mode", "Trucks", "Pallets", "Boxes", "Merged", "Corrected", "End"
    );
    println!("{}", "-".repeat(68));
    for r in &night.rounds {
        println!(
            "{:<6} {:<8} {:>6} {:>8} {:>8} {:>7} {:>9} {:>8}",
            r.round.to_string(),
            format!("{:?}", r.mode),
            r.trucks,
            r.pallets_post,
            r.boxes_post,
            r.merged,
            r.corrected,
            night_cfg.wall_label(r.operational_end),
        );
    }
    println!();

    println!("{:<14} {:>8} {:>10} {:>8}", "Station", "Ops", "Mean wait", "Util %");
    println!("{}", "-".repeat(44));
    for station in Station::ALL {
        let stats = night.stats.station(station);
        println!(
            "{:<14} {:>8} {:>10.2} {:>8.1}",
            station.as_str(),
            stats.count,
            stats.mean_wait(),
            night.utilization.station(station).percent(),
        );
    }
    println!();

    // 4. Handoff and day summary.
    let handoff = &night.handoff;
    println!(
        "Handoff: {} trucks en route, {} staged pallets ({} boxes), {} pending rounds",
        handoff.trucks_en_route.len(),
        handoff.staged_pallets(),
        handoff.staged_boxes(),
        handoff.pending_round_work.len(),
    );
    println!(
        "Day: {} pallets checked, {} departures, {} returns, {} lots unfinished",
        day.pallets_checked,
        day.departures.len(),
        day.returns.len(),
        day.unfinished_lots,
    );
    if let Some(last) = day.departures.last() {
        println!("  last departure: {} at {}", last.truck, clock_label(last.at_min));
    }
    println!();
    println!("Output written to {OUTPUT_DIR}/");

    Ok(())
}

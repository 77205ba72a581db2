//! Headless bake of many chamber seeds.
//! Runs the full pipeline against a recording host and reports how the
//! tracks ended.

use chamber_core::{ChamberConfig, Lifecycle};
use chamber_sim::{run_simulation, Driver, RecordingHost, Simulation};

#[derive(Default)]
struct Tally {
    runs: u32,
    failed: u32,
    decayed: u64,
    absorbed: u64,
    frames: i64,
    longest: i64,
    keyframes: u64,
}

fn main() {
    let num_runs = 50;
    let base = ChamberConfig::default();

    eprintln!(
        "Baking {} chambers ({} particles each, {} fps)...",
        num_runs, base.particle_count, base.fps
    );

    let mut tally = Tally::default();

    for r in 0..num_runs {
        let seed = 1000 + r as u64 * 7919;
        let config = ChamberConfig { seed, ..base.clone() };

        let mut sim = match Simulation::from_config(&config) {
            Ok(sim) => sim,
            Err(e) => {
                eprintln!("  seed {seed}: {e}");
                tally.failed += 1;
                continue;
            }
        };
        let mut host = RecordingHost::new();

        match run_simulation(&mut sim, &mut host, &config) {
            Ok(summary) => {
                tally.runs += 1;
                tally.frames += summary.last_frame;
                tally.longest = tally.longest.max(summary.last_frame);
                for p in sim.particles() {
                    match p.lifecycle {
                        Lifecycle::Decayed => tally.decayed += 1,
                        Lifecycle::Absorbed => tally.absorbed += 1,
                        Lifecycle::Alive => {}
                    }
                }
                tally.keyframes += host
                    .objects()
                    .iter()
                    .map(|o| (o.position_track.len() + o.visibility_track.len()) as u64)
                    .sum::<u64>();
            }
            Err(e) => {
                eprintln!("  seed {seed}: {e}");
                tally.failed += 1;
            }
        }
    }

    let ended = (tally.decayed + tally.absorbed).max(1) as f64;
    println!("=== CHAMBER BAKE ===");
    println!("Runs:       {} ok, {} failed", tally.runs, tally.failed);
    println!(
        "Decayed:    {} ({:.1}%)",
        tally.decayed,
        tally.decayed as f64 / ended * 100.0
    );
    println!(
        "Absorbed:   {} ({:.1}%)",
        tally.absorbed,
        tally.absorbed as f64 / ended * 100.0
    );
    if tally.runs > 0 {
        println!(
            "Frames:     {:.1} avg, {} longest",
            tally.frames as f64 / tally.runs as f64,
            tally.longest
        );
        println!(
            "Keyframes:  {:.0} per run",
            tally.keyframes as f64 / tally.runs as f64
        );
    }
}

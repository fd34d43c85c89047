//! demo - bounded trafficwatch run on synthetic cameras
//!
//! Runs the full pipeline in fallback mode for a fixed duration, prints
//! violations as they arrive, then dumps the ledger snapshot as CSV along
//! with aggregate statistics.

use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use trafficwatch_kernel::{
    violation_id_source, violations_to_csv, BackendSlot, CameraConfig, CameraWorker,
    FallbackGenerator, SyntheticCamera, SyntheticPlateReader, ViolationLedger, ViolationMapper,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// How long to run the synthetic cameras, in seconds.
    #[arg(long, default_value_t = 10)]
    duration_s: u64,
    /// Number of synthetic cameras.
    #[arg(long, default_value_t = 4)]
    cameras: usize,
    /// Ledger capacity (most recent violations kept).
    #[arg(long, default_value_t = 10)]
    capacity: usize,
    /// Per-camera cycle cadence in milliseconds.
    #[arg(long, default_value_t = 500)]
    cadence_ms: u64,
    /// Seed for deterministic fallback detections and plates.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // No model is loaded on purpose: the demo exercises fallback mode.
    let backend = Arc::new(BackendSlot::new());
    let ledger = Arc::new(ViolationLedger::new(args.capacity));
    let updates = ledger.subscribe();
    let ids = violation_id_source();

    let mut handles = Vec::with_capacity(args.cameras);
    for index in 0..args.cameras {
        let config = CameraConfig {
            id: format!("cam:junction_{}", index + 1),
            cadence_ms: args.cadence_ms,
            ..CameraConfig::default()
        };
        let (camera, fallback, plates) = match args.seed {
            Some(seed) => {
                let seed = seed.wrapping_add(index as u64);
                (
                    SyntheticCamera::with_seed(config, seed),
                    FallbackGenerator::with_seed(seed),
                    SyntheticPlateReader::with_seed(seed),
                )
            }
            None => (
                SyntheticCamera::new(config),
                FallbackGenerator::new(),
                SyntheticPlateReader::new(),
            ),
        };
        let worker = CameraWorker::new(
            Box::new(camera),
            backend.clone(),
            fallback,
            ViolationMapper::new(ids.clone(), Box::new(plates)),
            ledger.clone(),
            Duration::from_millis(args.cadence_ms),
        );
        handles.push(worker.spawn());
    }

    println!(
        "trafficwatch demo: {} cameras, {} s, mode={}",
        args.cameras,
        args.duration_s,
        if backend.is_ready() {
            "model"
        } else {
            "fallback"
        }
    );

    let deadline = Instant::now() + Duration::from_secs(args.duration_s);
    while Instant::now() < deadline {
        match updates.recv_timeout(Duration::from_millis(200)) {
            Ok(violation) => println!(
                "  {} {} plate={} location={} confidence={}%",
                violation.timestamp.format("%H:%M:%S"),
                violation.violation_type.label(),
                violation.plate,
                violation.location,
                violation.confidence
            ),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for handle in handles {
        handle.stop()?;
    }

    let stats = ledger.aggregate();
    println!();
    println!("{}", violations_to_csv(&ledger.snapshot()));
    println!(
        "totals: {} (helmetless={} overspeeding={} red_light={} triple_riding={})",
        stats.total, stats.helmetless, stats.overspeeding, stats.red_light, stats.triple_riding
    );

    Ok(())
}

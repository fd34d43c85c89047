//! trafficwatchd - traffic violation detection daemon
//!
//! This daemon:
//! 1. Loads configuration (JSON file + environment overrides)
//! 2. Attempts to load the detection model; a failed load is non-fatal and
//!    the pipeline runs in fallback mode indefinitely
//! 3. Spawns one periodic worker per configured camera
//! 4. Logs every violation pushed from the shared ledger
//! 5. Logs aggregate statistics periodically
//! 6. Shuts workers down cleanly on ctrl-c

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use trafficwatch_kernel::{
    BackendSlot, CameraWorker, FallbackGenerator, SyntheticCamera, SyntheticPlateReader,
    TrafficwatchdConfig, ViolationLedger, ViolationMapper,
};

const STATS_INTERVAL: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = TrafficwatchdConfig::load()?;

    let backend = Arc::new(BackendSlot::new());
    match cfg.model_path.as_deref() {
        Some(path) => {
            try_load_model(&backend, path);
        }
        None => log::info!("no model configured; running in fallback mode"),
    }

    let ledger = Arc::new(ViolationLedger::new(cfg.ledger_capacity));
    let updates = ledger.subscribe();
    let ids = trafficwatch_kernel::violation_id_source();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_handler.store(true, Ordering::SeqCst);
    })?;

    let mut handles = Vec::with_capacity(cfg.cameras.len());
    for (index, camera_cfg) in cfg.cameras.iter().enumerate() {
        let camera = SyntheticCamera::new(camera_cfg.clone());
        let (fallback, plates) = match cfg.fallback_seed {
            Some(seed) => (
                FallbackGenerator::with_seed(seed.wrapping_add(index as u64)),
                SyntheticPlateReader::with_seed(seed.wrapping_add(index as u64)),
            ),
            None => (FallbackGenerator::new(), SyntheticPlateReader::new()),
        };
        let mapper = ViolationMapper::new(ids.clone(), Box::new(plates));
        let worker = CameraWorker::new(
            Box::new(camera),
            backend.clone(),
            fallback,
            mapper,
            ledger.clone(),
            Duration::from_millis(camera_cfg.cadence_ms),
        );
        handles.push(worker.spawn());
    }

    log::info!(
        "trafficwatchd running: {} cameras, ledger capacity {}, mode={}",
        handles.len(),
        cfg.ledger_capacity,
        if backend.is_ready() {
            "model"
        } else {
            "fallback"
        }
    );

    let mut last_stats = Instant::now();
    while !shutdown.load(Ordering::SeqCst) {
        match updates.recv_timeout(Duration::from_millis(200)) {
            Ok(violation) => {
                log::info!(
                    "violation #{}: {} plate={} location={} confidence={}% fine=INR {}",
                    violation.id,
                    violation.violation_type.label(),
                    violation.plate,
                    violation.location,
                    violation.confidence,
                    violation.violation_type.fine_rupees()
                );
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if last_stats.elapsed() >= STATS_INTERVAL {
            let stats = ledger.aggregate();
            log::info!(
                "stats: total={} helmetless={} overspeeding={} red_light={} triple_riding={} mode={}",
                stats.total,
                stats.helmetless,
                stats.overspeeding,
                stats.red_light,
                stats.triple_riding,
                if backend.is_ready() {
                    "model"
                } else {
                    "fallback"
                }
            );
            last_stats = Instant::now();
        }
    }

    log::info!("shutting down {} camera workers", handles.len());
    for handle in handles {
        let camera_id = handle.camera_id.clone();
        if let Err(err) = handle.stop() {
            log::error!("{}: worker did not stop cleanly: {}", camera_id, err);
        }
    }

    Ok(())
}

#[cfg(feature = "backend-tract")]
fn try_load_model(backend: &BackendSlot, path: &str) -> bool {
    let path = path.to_string();
    backend.load_with(move || {
        let loaded = trafficwatch_kernel::TractBackend::load(&path)?;
        Ok(Box::new(loaded) as Box<dyn trafficwatch_kernel::InferenceBackend>)
    })
}

#[cfg(not(feature = "backend-tract"))]
fn try_load_model(_backend: &BackendSlot, path: &str) -> bool {
    log::warn!(
        "model path {} configured but this build lacks the backend-tract feature; \
         running in fallback mode",
        path
    );
    false
}

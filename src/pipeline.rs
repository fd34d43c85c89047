//! Per-camera processing cycle.
//!
//! Each camera runs an independent periodic cycle on its own thread:
//! capture -> preprocess -> inference (or fallback when the backend is not
//! ready) -> decode -> map -> ledger insert. Workers coordinate only through
//! the shared ledger and the shared backend readiness flag; there is no
//! central scheduler.
//!
//! At most one cycle per camera is in flight at any time: the cycle runs
//! inline on the worker thread before the next sleep, so an overrunning
//! cycle delays (never duplicates) the next tick. Stale frames are dropped
//! by construction, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::detect::{decode, BackendSlot, Detection, FallbackGenerator};
use crate::ingest::FrameSource;
use crate::ledger::ViolationLedger;
use crate::mapper::ViolationMapper;
use crate::tensor::preprocess;

/// One camera's processing pipeline.
pub struct CameraWorker {
    source: Box<dyn FrameSource>,
    backend: Arc<BackendSlot>,
    fallback: FallbackGenerator,
    mapper: ViolationMapper,
    ledger: Arc<ViolationLedger>,
    cadence: Duration,
}

impl CameraWorker {
    pub fn new(
        source: Box<dyn FrameSource>,
        backend: Arc<BackendSlot>,
        fallback: FallbackGenerator,
        mapper: ViolationMapper,
        ledger: Arc<ViolationLedger>,
        cadence: Duration,
    ) -> Self {
        Self {
            source,
            backend,
            fallback,
            mapper,
            ledger,
            cadence,
        }
    }

    /// Run a single processing cycle.
    ///
    /// An error (offline camera, malformed frame) skips the cycle; nothing
    /// reaches the ledger. A transient inference failure falls back to the
    /// synthetic generator for this frame only.
    pub fn run_cycle(&mut self) -> Result<()> {
        let frame = self.source.capture()?;

        let detections: Vec<Detection> = if self.backend.is_ready() {
            let tensor = preprocess(&frame)?;
            match self.backend.run(&tensor) {
                Ok(raw) => decode(&raw),
                Err(err) => {
                    log::warn!(
                        "{}: inference failed ({}); using fallback for this frame",
                        frame.source,
                        err
                    );
                    self.fallback.generate().into_iter().collect()
                }
            }
        } else {
            self.fallback.generate().into_iter().collect()
        };

        for detection in detections {
            let violation = self.mapper.map(&detection, &frame.source, frame.captured_at);
            log::debug!(
                "{}: {} plate={} confidence={}%",
                violation.location,
                violation.violation_type,
                violation.plate,
                violation.confidence
            );
            self.ledger.insert(violation);
        }

        Ok(())
    }

    /// Spawn the periodic worker thread.
    pub fn spawn(mut self) -> WorkerHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let camera_id = self.source.source_id().to_string();
        let thread_camera_id = camera_id.clone();
        let cadence = self.cadence;

        let join = std::thread::spawn(move || {
            log::info!(
                "{}: worker started (cadence {} ms)",
                thread_camera_id,
                cadence.as_millis()
            );
            while !shutdown_thread.load(Ordering::SeqCst) {
                let started = Instant::now();
                if let Err(err) = self.run_cycle() {
                    log::warn!("{}: cycle skipped: {}", thread_camera_id, err);
                }

                // Sleep the remainder of the cadence in short slices so
                // stop() is acknowledged promptly.
                loop {
                    if shutdown_thread.load(Ordering::SeqCst) {
                        break;
                    }
                    let Some(remaining) = cadence.checked_sub(started.elapsed()) else {
                        break;
                    };
                    std::thread::sleep(remaining.min(Duration::from_millis(50)));
                }
            }
            log::info!("{}: worker stopped", thread_camera_id);
        });

        WorkerHandle {
            camera_id,
            shutdown,
            join: Some(join),
        }
    }
}

/// Handle to a spawned camera worker.
pub struct WorkerHandle {
    pub camera_id: String,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Stop the worker: no further ticks are scheduled once acknowledged;
    /// an in-flight cycle finishes its ledger write first.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("camera worker thread panicked"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubBackend;
    use crate::ingest::{CameraConfig, SyntheticCamera};
    use crate::ledger::ViolationLedger;
    use crate::mapper::{violation_id_source, SyntheticPlateReader, ViolationMapper};
    use crate::violation::ViolationType;

    fn test_camera(id: &str, seed: u64) -> Box<dyn FrameSource> {
        let config = CameraConfig {
            id: id.to_string(),
            width: 64,
            height: 48,
            cadence_ms: 10,
        };
        Box::new(SyntheticCamera::with_seed(config, seed).with_dropout_chance(0.0))
    }

    fn test_worker(backend: Arc<BackendSlot>, ledger: Arc<ViolationLedger>) -> CameraWorker {
        CameraWorker::new(
            test_camera("cam:test", 1),
            backend,
            FallbackGenerator::with_seed(5),
            ViolationMapper::new(
                violation_id_source(),
                Box::new(SyntheticPlateReader::with_seed(5)),
            ),
            ledger,
            Duration::from_millis(10),
        )
    }

    #[test]
    fn ready_backend_cycles_insert_decoded_violations() {
        let backend = Arc::new(BackendSlot::new());
        assert!(backend.load_with(|| {
            Ok(Box::new(StubBackend::single_row(
                [10.0, 20.0, 30.0, 40.0],
                0.9,
                [0.95, 0.1, 0.1, 0.1],
            )))
        }));

        let ledger = Arc::new(ViolationLedger::new(10));
        let mut worker = test_worker(backend, ledger.clone());

        for _ in 0..3 {
            worker.run_cycle().unwrap();
        }

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 3);
        for violation in snapshot {
            assert_eq!(violation.violation_type, ViolationType::Helmetless);
            assert_eq!(violation.confidence, 86);
            assert_eq!(violation.location, "cam:test");
        }
    }

    #[test]
    fn unready_backend_routes_to_fallback() {
        let backend = Arc::new(BackendSlot::new());
        let ledger = Arc::new(ViolationLedger::new(100));
        let mut worker = test_worker(backend.clone(), ledger.clone());

        for _ in 0..100 {
            worker.run_cycle().unwrap();
        }

        assert!(!backend.is_ready());
        let snapshot = ledger.snapshot();
        assert!(!snapshot.is_empty());
        // Fallback cycles fire well below once per cycle.
        assert!(snapshot.len() < 60);
        for violation in snapshot {
            assert!((80..=100).contains(&violation.confidence));
        }
    }

    #[test]
    fn offline_capture_skips_the_cycle() {
        let config = CameraConfig {
            id: "cam:flaky".to_string(),
            width: 64,
            height: 48,
            cadence_ms: 10,
        };
        let camera = SyntheticCamera::with_seed(config, 2).with_dropout_chance(1.0);

        let ledger = Arc::new(ViolationLedger::new(10));
        let mut worker = CameraWorker::new(
            Box::new(camera),
            Arc::new(BackendSlot::new()),
            // A generator that would fire every cycle, to prove skipped
            // cycles insert nothing.
            FallbackGenerator::with_seed(5),
            ViolationMapper::new(
                violation_id_source(),
                Box::new(SyntheticPlateReader::with_seed(5)),
            ),
            ledger.clone(),
            Duration::from_millis(10),
        );

        // First capture flips the camera offline.
        assert!(worker.run_cycle().is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn malformed_frame_skips_the_cycle() {
        struct ZeroWidthSource;

        impl FrameSource for ZeroWidthSource {
            fn source_id(&self) -> &str {
                "cam:broken"
            }

            fn capture(&mut self) -> Result<crate::frame::Frame> {
                crate::frame::Frame::new(Vec::new(), 0, 480, "cam:broken".into(), chrono::Utc::now())
            }
        }

        let backend = Arc::new(BackendSlot::new());
        assert!(backend.load_with(|| {
            Ok(Box::new(StubBackend::single_row(
                [0.0; 4],
                0.9,
                [0.9, 0.1, 0.1, 0.1],
            )))
        }));

        let ledger = Arc::new(ViolationLedger::new(10));
        let mut worker = CameraWorker::new(
            Box::new(ZeroWidthSource),
            backend,
            FallbackGenerator::with_seed(5),
            ViolationMapper::new(
                violation_id_source(),
                Box::new(SyntheticPlateReader::with_seed(5)),
            ),
            ledger.clone(),
            Duration::from_millis(10),
        );

        // Preprocessing fails fast; nothing reaches the ledger.
        assert!(worker.run_cycle().is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn spawned_workers_stop_cleanly() {
        let backend = Arc::new(BackendSlot::new());
        let ledger = Arc::new(ViolationLedger::new(10));

        let handles: Vec<WorkerHandle> = (0..2)
            .map(|i| {
                CameraWorker::new(
                    test_camera(&format!("cam:junction_{}", i + 1), i as u64),
                    backend.clone(),
                    FallbackGenerator::with_seed(i as u64),
                    ViolationMapper::new(
                        violation_id_source(),
                        Box::new(SyntheticPlateReader::with_seed(i as u64)),
                    ),
                    ledger.clone(),
                    Duration::from_millis(20),
                )
                .spawn()
            })
            .collect();

        std::thread::sleep(Duration::from_millis(200));
        for handle in handles {
            handle.stop().unwrap();
        }

        // No further inserts after stop is acknowledged.
        let len_after_stop = ledger.len();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(ledger.len(), len_after_stop);
        assert!(ledger.len() <= ledger.capacity());
    }
}

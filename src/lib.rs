//! Traffic violation detection kernel.
//!
//! This crate implements the frame-to-violation pipeline behind the
//! trafficwatch dashboard. Per camera, on an independent cadence:
//!
//! 1. the source captures a fixed-size RGBA frame
//! 2. the preprocessor letterboxes it into a planar float tensor
//! 3. the inference backend runs the detection model, or the fallback
//!    generator stands in while the model is unavailable
//! 4. the decoder turns raw model output into typed detections
//! 5. the mapper attaches identity, plate, source, and timestamp
//! 6. the violation lands in the shared, bounded, newest-first ledger
//!
//! The ledger is the single point of truth for every downstream consumer
//! (dashboard, statistics, CSV export); its push channel is the only
//! outbound event the kernel emits. Backend readiness is surfaced
//! separately so a degraded (fallback-only) deployment is always
//! distinguishable from a healthy one.
//!
//! # Module Structure
//!
//! - `frame` / `tensor`: pixel buffers and model input construction
//! - `detect`: backend capability, decoder, fallback generator
//! - `mapper` / `violation`: detection-to-record mapping
//! - `ledger`: the shared bounded violation window
//! - `ingest`: camera sources
//! - `pipeline`: per-camera periodic workers
//! - `config` / `export`: daemon configuration and CSV serialization

use anyhow::{anyhow, Result};
use std::sync::OnceLock;

pub mod config;
pub mod detect;
pub mod export;
pub mod frame;
pub mod ingest;
pub mod ledger;
pub mod mapper;
pub mod pipeline;
pub mod tensor;
pub mod violation;

pub use config::TrafficwatchdConfig;
pub use detect::{
    decode, BackendError, BackendSlot, Detection, FallbackGenerator, InferenceBackend, ModelClass,
    RawOutput, StubBackend,
};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use export::violations_to_csv;
pub use frame::Frame;
pub use ingest::{CameraConfig, FrameSource, SyntheticCamera};
pub use ledger::{ViolationLedger, ViolationStats, DEFAULT_LEDGER_CAPACITY};
pub use mapper::{
    violation_id_source, PlateReader, SyntheticPlateReader, ViolationMapper,
};
pub use pipeline::{CameraWorker, WorkerHandle};
pub use tensor::{preprocess, Tensor, MODEL_INPUT_SIZE};
pub use violation::{Violation, ViolationType};

/// A conforming camera id is a local identifier, not free text.
///
/// Allowed: "cam:junction_1", "cam:main-road", "cam:lot_a"
/// Disallowed: anything with whitespace, slashes, or punctuation outside [_-].
pub fn validate_camera_id(camera_id: &str) -> Result<()> {
    // Compile once for hot paths.
    static CAMERA_ID_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = CAMERA_ID_RE.get_or_init(|| regex::Regex::new(r"^cam:[a-z0-9_-]{1,64}$").unwrap());

    let id = camera_id.to_lowercase();
    if !re.is_match(&id) {
        return Err(anyhow!(
            "camera id must match ^cam:[a-z0-9_-]{{1,64}}$, got '{}'",
            camera_id
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_id_allowlist() {
        assert!(validate_camera_id("cam:junction_1").is_ok());
        assert!(validate_camera_id("CAM:Junction_1").is_ok());
        assert!(validate_camera_id("cam:main-road").is_ok());

        assert!(validate_camera_id("junction_1").is_err());
        assert!(validate_camera_id("cam:junction 1").is_err());
        assert!(validate_camera_id("cam:").is_err());
        assert!(validate_camera_id("cam:a/b").is_err());
    }
}

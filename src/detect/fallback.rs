//! Synthetic detections for fallback mode.
//!
//! When the inference backend is unready (or a cycle hits a transient
//! failure), workers keep the output contract alive with low-rate synthetic
//! detections shaped like real ones. Downstream consumers cannot
//! structurally distinguish "no backend" from "backend saw nothing";
//! degraded mode is surfaced separately via the backend readiness flag.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detect::result::{Detection, ModelClass};

/// Fraction of calls that produce a detection.
pub const FALLBACK_DETECTION_RATE: f64 = 0.3;

/// Fixed bounding box for synthetic detections, model-input coordinates.
const FALLBACK_BBOX: [f32; 4] = [100.0, 100.0, 200.0, 150.0];

/// Generates zero or one synthetic detections per call.
pub struct FallbackGenerator {
    rng: StdRng,
}

impl FallbackGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Roughly 30% of calls return a detection with a uniformly drawn class
    /// and confidence in `[80, 99]`.
    pub fn generate(&mut self) -> Option<Detection> {
        if self.rng.gen::<f64>() >= FALLBACK_DETECTION_RATE {
            return None;
        }

        let class = ModelClass::ALL[self.rng.gen_range(0..ModelClass::COUNT)];
        let confidence = 80 + self.rng.gen_range(0..20u8);
        Some(Detection {
            class,
            confidence,
            bbox: FALLBACK_BBOX,
        })
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

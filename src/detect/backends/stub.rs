use crate::detect::backend::{BackendError, InferenceBackend, RawOutput};
use crate::tensor::Tensor;

/// Deterministic stub backend for tests and bring-up.
///
/// Returns the same canned raw output for every frame, so decode semantics
/// can be exercised end-to-end without a model artifact.
pub struct StubBackend {
    rows: Vec<f32>,
}

impl StubBackend {
    pub fn new(rows: Vec<f32>) -> Self {
        Self { rows }
    }

    /// Convenience constructor: one prediction row with the given bbox,
    /// objectness, and class scores.
    pub fn single_row(bbox: [f32; 4], objectness: f32, class_scores: [f32; 4]) -> Self {
        let mut rows = bbox.to_vec();
        rows.push(objectness);
        rows.extend_from_slice(&class_scores);
        Self { rows }
    }
}

impl InferenceBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn run(&self, _tensor: &Tensor) -> Result<RawOutput, BackendError> {
        Ok(RawOutput::new(self.rows.clone()))
    }
}

#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::{BackendError, InferenceBackend, RawOutput};
use crate::tensor::MODEL_INPUT_SIZE;

/// Tract-based backend for ONNX inference.
///
/// Loads a local model file and runs it on preprocessed tensors. Model
/// loading is the only I/O this backend performs.
pub struct TractBackend {
    model: TypedSimplePlan<TypedModel>,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = MODEL_INPUT_SIZE;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self { model })
    }
}

impl InferenceBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn run(&self, tensor: &crate::tensor::Tensor) -> Result<RawOutput, BackendError> {
        let size = MODEL_INPUT_SIZE;
        let input = tract_ndarray::Array4::from_shape_vec(
            (1, 3, size, size),
            tensor.data().to_vec(),
        )
        .map_err(|e| BackendError::Transient(format!("input shape mismatch: {}", e)))?
        .into_tensor();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| BackendError::Transient(format!("ONNX inference failed: {}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| BackendError::Transient("model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| BackendError::Transient(format!("model output was not f32: {}", e)))?;

        let data: Vec<f32> = view.iter().copied().collect();
        if data.iter().any(|v| !v.is_finite()) {
            return Err(BackendError::Transient(
                "model output contains non-finite values".to_string(),
            ));
        }

        Ok(RawOutput::new(data))
    }
}

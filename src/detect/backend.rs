//! Inference backend capability and readiness gate.
//!
//! The backend is an explicit capability object injected into each camera
//! worker, never process-global state, so tests can substitute a
//! deterministic stub. `BackendSlot` is the shared readiness gate: the model
//! is loaded once at startup (or not at all), every worker reads the flag,
//! and a worker observing an unready slot routes its cycle to the fallback
//! generator instead of blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyhow::Result;

use crate::tensor::Tensor;

/// Raw model output buffer.
///
/// Opaque to everything except the detection decoder, which knows the
/// prediction row layout.
#[derive(Clone, Debug, Default)]
pub struct RawOutput {
    data: Vec<f32>,
}

impl RawOutput {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Inference failure, split by recovery policy.
///
/// `Transient` failures cost a single frame: the caller falls back to the
/// fallback generator for that cycle and the backend stays ready.
/// `Structural` failures mean the model handle is lost: the slot flips to
/// unready and a reload must succeed before the next real inference.
#[derive(Clone, Debug)]
pub enum BackendError {
    Transient(String),
    Structural(String),
}

impl BackendError {
    pub fn is_structural(&self) -> bool {
        matches!(self, BackendError::Structural(_))
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Transient(msg) => write!(f, "transient inference failure: {}", msg),
            BackendError::Structural(msg) => write!(f, "structural backend failure: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// A loaded detection model.
///
/// Implementations must not panic on inference arithmetic errors they can
/// detect (NaN, shape mismatch); those are reported as
/// `BackendError::Transient`.
pub trait InferenceBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run inference on a preprocessed tensor.
    fn run(&self, tensor: &Tensor) -> Result<RawOutput, BackendError>;
}

/// Shared readiness gate over an optional backend.
///
/// Readiness is written during load and on structural failure, and read
/// (never written) by every camera worker's cycle, so a plain atomic flag
/// is sufficient.
pub struct BackendSlot {
    backend: RwLock<Option<Box<dyn InferenceBackend>>>,
    ready: AtomicBool,
}

impl BackendSlot {
    /// New slot in the unready state.
    pub fn new() -> Self {
        Self {
            backend: RwLock::new(None),
            ready: AtomicBool::new(false),
        }
    }

    /// Attempt to acquire a backend.
    ///
    /// Idempotent: a no-op returning `true` while already ready. While
    /// unready, each call is a fresh attempt; a failed load is logged and
    /// reported as `false`, never a panic. Returns whether the slot is
    /// ready afterwards.
    pub fn load_with<F>(&self, loader: F) -> bool
    where
        F: FnOnce() -> Result<Box<dyn InferenceBackend>>,
    {
        if self.ready.load(Ordering::Acquire) {
            return true;
        }

        match loader() {
            Ok(backend) => {
                log::info!("inference backend '{}' loaded", backend.name());
                let Ok(mut slot) = self.backend.write() else {
                    log::error!("backend slot lock poisoned; staying in fallback mode");
                    return false;
                };
                *slot = Some(backend);
                self.ready.store(true, Ordering::Release);
                true
            }
            Err(err) => {
                log::warn!("model load failed: {}; running in fallback mode", err);
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Run inference through the loaded backend.
    ///
    /// Calling while unready is a contract violation by the caller (workers
    /// must route to the fallback generator instead); it is still reported
    /// as a structural error rather than a panic. A structural error from
    /// the backend drops the handle and flips the slot to unready.
    pub fn run(&self, tensor: &Tensor) -> Result<RawOutput, BackendError> {
        let result = {
            let guard = self
                .backend
                .read()
                .map_err(|_| BackendError::Structural("backend lock poisoned".to_string()))?;
            let Some(backend) = guard.as_ref() else {
                return Err(BackendError::Structural("backend not loaded".to_string()));
            };
            backend.run(tensor)
        };

        if let Err(err) = &result {
            if err.is_structural() {
                self.invalidate();
            }
        }
        result
    }

    fn invalidate(&self) {
        self.ready.store(false, Ordering::Release);
        if let Ok(mut slot) = self.backend.write() {
            *slot = None;
        }
        log::warn!("inference backend invalidated; reverting to fallback mode");
    }
}

impl Default for BackendSlot {
    fn default() -> Self {
        Self::new()
    }
}

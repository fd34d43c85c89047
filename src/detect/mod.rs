mod backend;
mod backends;
mod decoder;
mod fallback;
mod result;

pub use backend::{BackendError, BackendSlot, InferenceBackend, RawOutput};
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use decoder::{decode, CONFIDENCE_FLOOR, OBJECTNESS_THRESHOLD};
pub use fallback::{FallbackGenerator, FALLBACK_DETECTION_RATE};
pub use result::{Detection, ModelClass};

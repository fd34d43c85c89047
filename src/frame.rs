//! Camera frame container.
//!
//! A `Frame` is a dense RGBA8 pixel buffer captured by one camera source.
//! Frames are immutable once captured and owned exclusively by the calling
//! worker for the duration of one processing cycle, so `Frame` is
//! deliberately not `Clone`.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

/// Interleaved channels per pixel (R, G, B, A).
pub const FRAME_CHANNELS: usize = 4;

/// A single captured frame: interleaved RGBA bytes, row-major.
#[derive(Debug)]
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Camera source identifier.
    pub source: String,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Create a frame from an interleaved RGBA buffer.
    ///
    /// The buffer length must match `width * height * 4`. Zero dimensions are
    /// accepted here and rejected by the preprocessor, which is the stage
    /// with the fail-fast contract.
    pub fn new(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        source: String,
        captured_at: DateTime<Utc>,
    ) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(FRAME_CHANNELS))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame buffer length mismatch: expected {} RGBA bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }

        Ok(Self {
            pixels,
            width,
            height,
            source,
            captured_at,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_validates_buffer_length() {
        let ok = Frame::new(vec![0u8; 2 * 2 * 4], 2, 2, "cam:test".into(), Utc::now());
        assert!(ok.is_ok());

        let short = Frame::new(vec![0u8; 7], 2, 2, "cam:test".into(), Utc::now());
        assert!(short.is_err());
    }

    #[test]
    fn zero_dimension_frame_is_constructible() {
        // The preprocessor owns the fail-fast check; an empty buffer with a
        // zero dimension is a valid (if useless) frame.
        let frame = Frame::new(Vec::new(), 0, 4, "cam:test".into(), Utc::now());
        assert!(frame.is_ok());
    }
}

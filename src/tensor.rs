//! Model input tensor construction.
//!
//! The preprocessor turns an RGBA frame of any size into the fixed-shape
//! planar float tensor the detection model consumes: letterbox-resize to
//! `MODEL_INPUT_SIZE` squared (uniform scale, centered, zero padding), then
//! one `channel / 255.0` float per pixel, all R values first, then G, then B.
//! The alpha channel is dropped.

use anyhow::{anyhow, Result};

use crate::frame::{Frame, FRAME_CHANNELS};

/// Model input edge length. Input tensors are always S x S.
pub const MODEL_INPUT_SIZE: usize = 640;

/// Planar RGB float tensor, logical shape `[1, 3, S, S]`, values in `[0, 1]`.
///
/// Produced by `preprocess`, consumed and discarded by the inference backend.
#[derive(Clone, Debug)]
pub struct Tensor {
    data: Vec<f32>,
}

impl Tensor {
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub const fn shape() -> [usize; 4] {
        [1, 3, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE]
    }
}

/// Convert a frame into a model-ready tensor.
///
/// Deterministic, pure function of the frame. Letterboxing preserves the
/// aspect ratio via uniform scale-and-pad; the frame is never distorted.
/// Nearest-neighbor sampling keeps the transform exact and cheap.
///
/// Zero-dimension frames are a precondition violation and fail immediately;
/// no degenerate tensor is ever produced.
pub fn preprocess(frame: &Frame) -> Result<Tensor> {
    if frame.width == 0 || frame.height == 0 {
        return Err(anyhow!(
            "frame dimensions must be non-zero, got {}x{}",
            frame.width,
            frame.height
        ));
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    let expected = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(FRAME_CHANNELS))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
    let pixels = frame.pixels();
    if pixels.len() != expected {
        return Err(anyhow!(
            "frame buffer length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }

    let size = MODEL_INPUT_SIZE;
    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let scaled_w = ((width as f32 * scale).round() as usize).clamp(1, size);
    let scaled_h = ((height as f32 * scale).round() as usize).clamp(1, size);
    let pad_x = (size - scaled_w) / 2;
    let pad_y = (size - scaled_h) / 2;

    let plane = size * size;
    let mut data = vec![0.0f32; 3 * plane];

    for y in 0..scaled_h {
        let src_y = (((y as f32 + 0.5) / scale) as usize).min(height - 1);
        for x in 0..scaled_w {
            let src_x = (((x as f32 + 0.5) / scale) as usize).min(width - 1);
            let src = (src_y * width + src_x) * FRAME_CHANNELS;
            let dst = (pad_y + y) * size + (pad_x + x);
            data[dst] = pixels[src] as f32 / 255.0;
            data[plane + dst] = pixels[src + 1] as f32 / 255.0;
            data[2 * plane + dst] = pixels[src + 2] as f32 / 255.0;
        }
    }

    Ok(Tensor { data })
}

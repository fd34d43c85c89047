//! Raw model output decoding.
//!
//! Raw output is a flat buffer of prediction rows with stride `5 + C`:
//! x, y, w, h, objectness, then one score per known class. The decoder
//! applies the objectness gate, picks the best class, and combines
//! objectness with the class score into an integer-percent confidence.

use crate::detect::backend::RawOutput;
use crate::detect::result::{Detection, ModelClass};

/// Rows with objectness at or below this are discarded.
pub const OBJECTNESS_THRESHOLD: f32 = 0.5;

/// Minimum combined confidence, integer percent. Outputs below this are
/// discarded, never surfaced.
pub const CONFIDENCE_FLOOR: u8 = 50;

const PREDICTION_STRIDE: usize = 5 + ModelClass::COUNT;

/// Decode raw model output into typed detections.
///
/// An empty result is valid (the model saw nothing interesting). A buffer
/// whose length is not a multiple of the prediction stride is a decode
/// anomaly: it is logged and treated as zero detections, never an error.
pub fn decode(raw: &RawOutput) -> Vec<Detection> {
    let data = raw.as_slice();
    if data.is_empty() {
        return Vec::new();
    }
    if data.len() % PREDICTION_STRIDE != 0 {
        log::warn!(
            "raw output length {} is not a multiple of stride {}; dropping frame output",
            data.len(),
            PREDICTION_STRIDE
        );
        return Vec::new();
    }

    let mut detections = Vec::new();
    for row in data.chunks_exact(PREDICTION_STRIDE) {
        let objectness = row[4];
        // The comparison is written so NaN objectness is discarded too.
        if !(objectness > OBJECTNESS_THRESHOLD) {
            continue;
        }

        // Argmax over class scores; strict `>` keeps the lowest index on ties.
        let mut best_index = 0usize;
        let mut best_score = row[5];
        for (index, &score) in row[5..].iter().enumerate().skip(1) {
            if score > best_score {
                best_score = score;
                best_index = index;
            }
        }

        let confidence = (objectness * best_score * 100.0).round().clamp(0.0, 100.0) as u8;
        if confidence < CONFIDENCE_FLOOR {
            continue;
        }

        let Some(class) = ModelClass::from_index(best_index) else {
            continue;
        };
        detections.push(Detection {
            class,
            confidence,
            bbox: [row[0], row[1], row[2], row[3]],
        });
    }

    detections
}

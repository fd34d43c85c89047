use anyhow::{anyhow, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::frame::{Frame, FRAME_CHANNELS};

/// Per-camera settings.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Camera identifier (e.g. "cam:junction_1").
    pub id: String,
    pub width: u32,
    pub height: u32,
    /// Processing cycle cadence for this camera.
    pub cadence_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            id: "cam:junction_1".to_string(),
            width: 640,
            height: 480,
            cadence_ms: 2000,
        }
    }
}

/// Frame capture contract.
///
/// Implementations supply frames on demand with a stable width and height
/// per source.
pub trait FrameSource: Send {
    fn source_id(&self) -> &str;

    fn capture(&mut self) -> Result<Frame>;
}

/// Synthetic camera source.
///
/// Generates a deterministic pixel pattern that drifts over time, standing
/// in for a decoded live feed. Occasionally flips between connected and
/// offline to model real feed drop-outs; an offline capture is an error for
/// that cycle, not a terminal state.
pub struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
    /// Simulated scene state; bumped periodically so frames change.
    scene_state: u8,
    connected: bool,
    dropout_chance: f64,
    rng: StdRng,
}

const DEFAULT_DROPOUT_CHANCE: f64 = 0.05;

impl SyntheticCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic camera for tests.
    pub fn with_seed(config: CameraConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: CameraConfig, rng: StdRng) -> Self {
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
            connected: true,
            dropout_chance: DEFAULT_DROPOUT_CHANCE,
            rng,
        }
    }

    /// Override the connection flap probability (0 disables drop-outs).
    pub fn with_dropout_chance(mut self, chance: f64) -> Self {
        self.dropout_chance = chance;
        self
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.config.width as usize) * (self.config.height as usize);
        let mut pixels = vec![0u8; pixel_count * FRAME_CHANNELS];
        for (i, px) in pixels.chunks_exact_mut(FRAME_CHANNELS).enumerate() {
            // Mix position, frame count, and scene state for variation.
            let v = (i as u64)
                .wrapping_add(self.frame_count)
                .wrapping_add(self.scene_state as u64);
            px[0] = v as u8;
            px[1] = (v >> 2) as u8;
            px[2] = (v >> 4) as u8;
            px[3] = 0xFF;
        }
        pixels
    }
}

impl FrameSource for SyntheticCamera {
    fn source_id(&self) -> &str {
        &self.config.id
    }

    fn capture(&mut self) -> Result<Frame> {
        if self.dropout_chance > 0.0 && self.rng.gen::<f64>() < self.dropout_chance {
            self.connected = !self.connected;
            if self.connected {
                log::info!("{}: feed reconnected", self.config.id);
            }
        }
        if !self.connected {
            return Err(anyhow!("camera {} is offline", self.config.id));
        }

        self.frame_count += 1;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let pixels = self.generate_pixels();
        Frame::new(
            pixels,
            self.config.width,
            self.config.height,
            self.config.id.clone(),
            Utc::now(),
        )
    }
}

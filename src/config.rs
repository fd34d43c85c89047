//! Daemon configuration.
//!
//! Configuration is resolved in three stages: a JSON config file (path in
//! `TRAFFICWATCH_CONFIG`), environment variable overrides, then validation.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::ingest::CameraConfig;
use crate::ledger::DEFAULT_LEDGER_CAPACITY;

const DEFAULT_CAMERA_COUNT: usize = 4;
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_CADENCE_MS: u64 = 2000;

#[derive(Debug, Deserialize, Default)]
struct TrafficwatchdConfigFile {
    model_path: Option<String>,
    ledger_capacity: Option<usize>,
    fallback_seed: Option<u64>,
    cameras: Option<Vec<CameraConfigFile>>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    id: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    cadence_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TrafficwatchdConfig {
    /// Path to the ONNX model artifact; `None` runs fallback-only.
    pub model_path: Option<String>,
    pub ledger_capacity: usize,
    /// Seed for deterministic fallback/plate randomness; `None` uses entropy.
    pub fallback_seed: Option<u64>,
    pub cameras: Vec<CameraConfig>,
}

impl TrafficwatchdConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TRAFFICWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TrafficwatchdConfigFile) -> Self {
        let cameras = match file.cameras {
            Some(cameras) if !cameras.is_empty() => cameras
                .into_iter()
                .enumerate()
                .map(|(index, camera)| CameraConfig {
                    id: camera
                        .id
                        .unwrap_or_else(|| default_camera_id(index + 1)),
                    width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                    height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
                    cadence_ms: camera.cadence_ms.unwrap_or(DEFAULT_CADENCE_MS),
                })
                .collect(),
            _ => default_cameras(),
        };

        Self {
            model_path: file.model_path,
            ledger_capacity: file.ledger_capacity.unwrap_or(DEFAULT_LEDGER_CAPACITY),
            fallback_seed: file.fallback_seed,
            cameras,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("TRAFFICWATCH_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = Some(path);
            }
        }
        if let Ok(capacity) = std::env::var("TRAFFICWATCH_LEDGER_CAPACITY") {
            self.ledger_capacity = capacity
                .parse()
                .map_err(|_| anyhow!("TRAFFICWATCH_LEDGER_CAPACITY must be an integer"))?;
        }
        if let Ok(seed) = std::env::var("TRAFFICWATCH_FALLBACK_SEED") {
            self.fallback_seed = Some(
                seed.parse()
                    .map_err(|_| anyhow!("TRAFFICWATCH_FALLBACK_SEED must be an integer"))?,
            );
        }
        if let Ok(cameras) = std::env::var("TRAFFICWATCH_CAMERAS") {
            let ids = split_csv(&cameras);
            if !ids.is_empty() {
                self.cameras = ids
                    .into_iter()
                    .map(|id| CameraConfig {
                        id,
                        width: DEFAULT_CAMERA_WIDTH,
                        height: DEFAULT_CAMERA_HEIGHT,
                        cadence_ms: DEFAULT_CADENCE_MS,
                    })
                    .collect();
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.ledger_capacity == 0 {
            return Err(anyhow!("ledger_capacity must be greater than zero"));
        }
        if self.cameras.is_empty() {
            return Err(anyhow!("at least one camera must be configured"));
        }
        for camera in &mut self.cameras {
            crate::validate_camera_id(&camera.id)?;
            camera.id = camera.id.to_lowercase();
            if camera.width == 0 || camera.height == 0 {
                return Err(anyhow!(
                    "camera {} has zero dimension {}x{}",
                    camera.id,
                    camera.width,
                    camera.height
                ));
            }
            if camera.cadence_ms == 0 {
                return Err(anyhow!("camera {} has zero cadence", camera.id));
            }
        }
        Ok(())
    }
}

fn default_camera_id(index: usize) -> String {
    format!("cam:junction_{}", index)
}

fn default_cameras() -> Vec<CameraConfig> {
    (1..=DEFAULT_CAMERA_COUNT)
        .map(|index| CameraConfig {
            id: default_camera_id(index),
            width: DEFAULT_CAMERA_WIDTH,
            height: DEFAULT_CAMERA_HEIGHT,
            cadence_ms: DEFAULT_CADENCE_MS,
        })
        .collect()
}

fn read_config_file(path: &Path) -> Result<TrafficwatchdConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_four_junction_cameras() {
        let cfg = TrafficwatchdConfig::from_file(TrafficwatchdConfigFile::default());
        assert_eq!(cfg.ledger_capacity, DEFAULT_LEDGER_CAPACITY);
        assert_eq!(cfg.cameras.len(), DEFAULT_CAMERA_COUNT);
        assert_eq!(cfg.cameras[0].id, "cam:junction_1");
        assert_eq!(cfg.cameras[3].id, "cam:junction_4");
        assert!(cfg.model_path.is_none());
    }

    #[test]
    fn validation_rejects_bad_camera_ids() {
        let mut cfg = TrafficwatchdConfig::from_file(TrafficwatchdConfigFile::default());
        cfg.cameras[0].id = "junction one".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_capacity() {
        let mut cfg = TrafficwatchdConfig::from_file(TrafficwatchdConfigFile::default());
        cfg.ledger_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_dimensions() {
        let mut cfg = TrafficwatchdConfig::from_file(TrafficwatchdConfigFile::default());
        cfg.cameras[1].width = 0;
        assert!(cfg.validate().is_err());
    }
}

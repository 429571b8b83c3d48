//! Application configuration.
//!
//! Stored as JSON with a schema version. Missing fields take their defaults,
//! so a config file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use viewfinder_core::{DeviceOrientation, PixelSize, Result, Size, ViewfinderError};
use viewfinder_framing::{FilmFormat, FramingSpec};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Schema version of the file this was read from.
    pub version: u32,
    /// Filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// `.cube` LUT applied to preview and captures; identity when unset.
    pub lut_path: Option<PathBuf>,
    /// Where captures and their sidecars are written.
    pub output_dir: PathBuf,
    /// Live preview size in pixels.
    pub viewport: PixelSize,
    /// Camera frame size (landscape, sensor orientation).
    pub sensor: PixelSize,
    pub frame_rate: f32,
    pub refresh_rate: f32,
    /// Number of refreshes before exiting.
    pub refresh_count: u32,
    /// Captures taken at even intervals across the run.
    pub captures: u32,
    pub orientation: DeviceOrientation,
    pub focal_length_mm: f32,
    pub film: FilmFormat,
    pub device_hfov_deg: f32,
    pub aspect_ratio: Option<f32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            log_filter: "info".to_string(),
            lut_path: None,
            output_dir: PathBuf::from("captures"),
            viewport: PixelSize::new(390, 844),
            sensor: PixelSize::new(1920, 1080),
            frame_rate: 30.0,
            refresh_rate: 60.0,
            refresh_count: 180,
            captures: 2,
            orientation: DeviceOrientation::Portrait,
            focal_length_mm: 50.0,
            film: FilmFormat::Full35,
            device_hfov_deg: 69.4,
            aspect_ratio: None,
        }
    }
}

impl AppConfig {
    /// `<config dir>/viewfinder/config.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("viewfinder").join("config.json"))
    }

    /// Framing inputs for the configured viewport and orientation.
    pub fn framing(&self) -> FramingSpec {
        FramingSpec {
            focal_length_mm: self.focal_length_mm,
            film: self.film,
            device_hfov_deg: self.device_hfov_deg,
            container: Size::from(self.viewport),
            orientation: self.orientation,
            aspect_ratio: self.aspect_ratio,
        }
    }

    /// Refreshes between captures, spreading them evenly across the run.
    pub fn capture_interval(&self) -> u32 {
        (self.refresh_count / self.captures.saturating_add(1)).max(1)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.viewport.is_empty() {
            return Err(ViewfinderError::Config(format!(
                "viewport {} is empty",
                self.viewport
            )));
        }
        if self.sensor.is_empty() || self.sensor.width % 2 != 0 || self.sensor.height % 2 != 0 {
            return Err(ViewfinderError::Config(format!(
                "sensor size {} must be non-empty and even",
                self.sensor
            )));
        }
        if !is_positive(self.frame_rate) || !is_positive(self.refresh_rate) {
            return Err(ViewfinderError::Config(format!(
                "rates must be positive (frame {}, refresh {})",
                self.frame_rate, self.refresh_rate
            )));
        }
        if !is_positive(self.focal_length_mm) || !is_positive(self.device_hfov_deg) {
            return Err(ViewfinderError::Config(
                "focal length and field of view must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| ViewfinderError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| ViewfinderError::Serialization(format!("Invalid config: {}", e)))?;
        if config.version > CURRENT_VERSION {
            return Err(ViewfinderError::Config(format!(
                "Config version {} is newer than supported version {}",
                config.version, CURRENT_VERSION
            )));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    /// Load from [`Self::default_path`], or defaults when there is no file.
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

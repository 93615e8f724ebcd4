//! Configuration
//!
//! Tunables for tempo analysis and export, loadable from a JSON file.
//! Every field has a default, so a config file only needs the keys it
//! overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoopError, Result};
use crate::export::profile::TargetDevice;

/// Tempo estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Input samples folded into one RMS envelope point
    pub downsample_factor: usize,
    /// Length of the analysis window from the start of the envelope
    pub analysis_seconds: f64,
    /// Slowest tempo considered
    pub min_bpm: f64,
    /// Fastest tempo considered
    pub max_bpm: f64,
    /// Returned when no lag correlates positively
    pub default_bpm: u32,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            downsample_factor: 16,
            analysis_seconds: 15.0,
            min_bpm: 50.0,
            max_bpm: 220.0,
            default_bpm: 120,
        }
    }
}

impl TempoConfig {
    pub fn validate(&self) -> Result<()> {
        if self.downsample_factor == 0 {
            return Err(config_error("tempo.downsample_factor must be at least 1"));
        }
        if !(self.analysis_seconds > 0.0) {
            return Err(config_error("tempo.analysis_seconds must be positive"));
        }
        if !(self.min_bpm > 0.0) || !(self.max_bpm > self.min_bpm) {
            return Err(config_error(
                "tempo.min_bpm must be positive and below tempo.max_bpm",
            ));
        }
        if self.default_bpm == 0 {
            return Err(config_error("tempo.default_bpm must be positive"));
        }
        Ok(())
    }
}

/// Export defaults used by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Target device name or slug, see `TargetDevice`
    pub target_device: String,
    /// Directory exported files are written to
    pub output_dir: PathBuf,
    /// Pause between files of a batch export
    pub batch_delay_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            target_device: TargetDevice::default().name().to_string(),
            output_dir: PathBuf::from("."),
            batch_delay_ms: 0,
        }
    }
}

impl ExportConfig {
    /// Parsed target device
    pub fn device(&self) -> Result<TargetDevice> {
        self.target_device.parse()
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tempo: TempoConfig,
    pub export: ExportConfig,
}

impl Config {
    /// Load and validate a JSON configuration file
    ///
    /// # Errors
    /// * `FileNotFound` - if the file does not exist
    /// * `Serialization` - if the file is not valid JSON for this schema
    /// * `Config` - if a value is out of range
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LoopError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.tempo.validate()?;
        self.export.device().map_err(|e| config_error(&e.to_string()))?;
        Ok(())
    }
}

fn config_error(reason: &str) -> LoopError {
    LoopError::Config {
        reason: reason.to_string(),
    }
}

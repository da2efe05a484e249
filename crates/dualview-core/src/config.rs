//! Application configuration

use crate::{types::Size, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings shared by both surfaces.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Output canvas of the display surface
    pub canvas: Size,
    /// Frame size of the embedded video widget
    pub embed_source: Size,
    /// Width of the control-surface preview box in pixels
    pub preview_width: f64,
    /// Playback telemetry cadence (milliseconds)
    pub poll_interval_ms: u64,
    /// Degraded-mode ready fallback for the embedded widget (milliseconds)
    pub ready_timeout_ms: u64,
    /// Clock overlay refresh (milliseconds)
    pub clock_interval_ms: u64,
    /// Folder scanned at startup, if any
    pub media_dir: Option<PathBuf>,
    /// Pin the control window above others on launch
    pub always_on_top: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas: Size::OUTPUT_CANVAS,
            embed_source: Size::EMBED_SOURCE,
            preview_width: 600.0,
            poll_interval_ms: 250,
            ready_timeout_ms: 5000,
            clock_interval_ms: 10_000,
            media_dir: None,
            always_on_top: true,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file, falling back to defaults for missing keys
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the surfaces cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.canvas.is_usable() {
            return Err(Error::InvalidConfig(format!("canvas {} is not drawable", self.canvas)));
        }
        if !self.embed_source.is_usable() {
            return Err(Error::InvalidConfig(format!(
                "embed source {} is not drawable",
                self.embed_source
            )));
        }
        if !(self.preview_width.is_finite() && self.preview_width > 0.0) {
            return Err(Error::InvalidConfig("preview_width must be positive".into()));
        }
        if self.poll_interval_ms == 0 || self.clock_interval_ms == 0 {
            return Err(Error::InvalidConfig("timer intervals must be non-zero".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms)
    }
}

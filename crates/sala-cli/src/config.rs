//! Render configuration loaded from TOML.
//!
//! ```toml
//! [reverb]
//! predelay_ms = 30.0
//! decay = 0.9
//! diffusion = 0.7
//! highpass_hz = 80.0
//! lowpass_hz = 9000.0
//!
//! [render]
//! mix = 0.35
//! network_size = 16
//! block_size = 256
//! early_level = 0.6
//! slope = "db24"
//! bit_depth = 24
//! tail_seconds = 4.0
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use crate::error::ConfigError;
use sala_reverb::{DEFAULT_EARLY_LEVEL, DEFAULT_MIX, FilterSlope, ReverbParams};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Network sizes the CLI can instantiate.
pub const NETWORK_SIZES: [usize; 3] = [4, 8, 16];

/// Longest tail the renderer appends, in seconds.
pub const MAX_TAIL_SECONDS: f32 = 600.0;

/// Everything a render needs besides the audio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Reverb controls.
    pub reverb: ReverbParams,
    /// Host-side settings.
    pub render: RenderSettings,
}

/// Host-side settings of a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    /// Dry/wet blend, 0 = dry, 1 = wet.
    pub mix: f32,
    /// When false the input is copied through unprocessed.
    pub enabled: bool,
    /// Number of delay lines: 4, 8 or 16.
    pub network_size: usize,
    /// Frames per processing block.
    pub block_size: usize,
    /// Early-reflection blend weight.
    pub early_level: f32,
    /// High-pass slope of each line.
    pub slope: FilterSlope,
    /// Output bit depth: 16, 24 or 32 (float).
    pub bit_depth: u16,
    /// Silence appended after the input so the tail is captured.
    pub tail_seconds: f32,
    /// Seed of the denormal guard's noise.
    pub seed: Option<u32>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            mix: DEFAULT_MIX,
            enabled: true,
            network_size: 8,
            block_size: 512,
            early_level: DEFAULT_EARLY_LEVEL,
            slope: FilterSlope::default(),
            bit_depth: 32,
            tail_seconds: 3.0,
            seed: None,
        }
    }
}

impl RenderConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded render config");
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no clamp can repair.
    ///
    /// Reverb controls outside their ranges are accepted; the engine clamps
    /// them, and [`clamp_notice`](Self::clamp_notice) reports what changed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let render = &self.render;
        if !NETWORK_SIZES.contains(&render.network_size) {
            return Err(ConfigError::invalid(
                "network_size",
                format!("{} is not one of 4, 8, 16", render.network_size),
            ));
        }
        if render.block_size == 0 {
            return Err(ConfigError::invalid("block_size", "must be at least 1"));
        }
        if !matches!(render.bit_depth, 16 | 24 | 32) {
            return Err(ConfigError::invalid(
                "bit_depth",
                format!("{} is not one of 16, 24, 32", render.bit_depth),
            ));
        }
        if !(0.0..=MAX_TAIL_SECONDS).contains(&render.tail_seconds) {
            return Err(ConfigError::invalid(
                "tail_seconds",
                format!("{} is outside 0..={MAX_TAIL_SECONDS}", render.tail_seconds),
            ));
        }
        if render.mix.is_nan() {
            return Err(ConfigError::invalid("mix", "NaN"));
        }
        Ok(())
    }

    /// Reverb controls as the engine will see them, or `None` when they are
    /// already in range.
    pub fn clamp_notice(&self) -> Option<ReverbParams> {
        let clamped = self.reverb.clamped();
        (clamped != self.reverb).then_some(clamped)
    }
}

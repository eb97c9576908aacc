//! Runtime configuration.
//!
//! Resolved once at attach: defaults, then an optional JSON file named by
//! [`CONFIG_PATH_VAR`], then single-value environment overrides.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::CaptureError;
use crate::types::{DispatchMode, UpscaleMode};

pub const CONFIG_PATH_VAR: &str = "PRESENT_UPSCALE_CONFIG";
pub const MODE_VAR: &str = "PRESENT_UPSCALE_MODE";
pub const FACTOR_VAR: &str = "PRESENT_UPSCALE_FACTOR";
pub const SHARPNESS_VAR: &str = "PRESENT_UPSCALE_SHARPNESS";
pub const DISPATCH_VAR: &str = "PRESENT_UPSCALE_DISPATCH";

pub const MAX_SCALE_FACTOR: u32 = 8;
pub const MAX_SHARPNESS: f32 = 2.0;

/// Locations of the neural model's graph description and weights.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    pub param: PathBuf,
    pub weights: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            param: PathBuf::from("models/cunet-noise0.param"),
            weights: PathBuf::from("models/cunet-noise0.bin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpscaleConfig {
    pub mode: UpscaleMode,
    /// Output extent is the input extent times this factor, on both axes.
    pub scale_factor: u32,
    /// Spatial sharpening strength; 0.0 is the sharpest.
    pub sharpness: f32,
    pub dispatch: DispatchMode,
    /// Capacity of the frame handoff queue in pipelined mode.
    pub queue_capacity: usize,
    /// Registry cap on concurrently tracked surfaces.
    pub max_surfaces: usize,
    pub model: ModelPaths,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            mode: UpscaleMode::Hybrid,
            scale_factor: 2,
            sharpness: 0.2,
            dispatch: DispatchMode::Synchronous,
            queue_capacity: 4,
            max_surfaces: 8,
            model: ModelPaths::default(),
        }
    }
}

impl UpscaleConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve with an injectable variable lookup.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), CaptureError> {
        if let Some(mode) = lookup(MODE_VAR) {
            self.mode = mode.parse()?;
            debug!("{MODE_VAR} override: {}", self.mode);
        }
        if let Some(factor) = lookup(FACTOR_VAR) {
            self.scale_factor = factor
                .trim()
                .parse()
                .map_err(|_| CaptureError::Config(format!("{FACTOR_VAR}='{factor}' is not an integer")))?;
            debug!("{FACTOR_VAR} override: {}", self.scale_factor);
        }
        if let Some(sharpness) = lookup(SHARPNESS_VAR) {
            self.sharpness = sharpness
                .trim()
                .parse()
                .map_err(|_| CaptureError::Config(format!("{SHARPNESS_VAR}='{sharpness}' is not a number")))?;
            debug!("{SHARPNESS_VAR} override: {}", self.sharpness);
        }
        if let Some(dispatch) = lookup(DISPATCH_VAR) {
            self.dispatch = dispatch.parse()?;
            debug!("{DISPATCH_VAR} override: {:?}", self.dispatch);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if !(1..=MAX_SCALE_FACTOR).contains(&self.scale_factor) {
            return Err(CaptureError::Config(format!(
                "scale_factor {} outside 1..={MAX_SCALE_FACTOR}",
                self.scale_factor
            )));
        }
        if !self.sharpness.is_finite() || !(0.0..=MAX_SHARPNESS).contains(&self.sharpness) {
            return Err(CaptureError::Config(format!(
                "sharpness {} outside 0.0..={MAX_SHARPNESS}",
                self.sharpness
            )));
        }
        if self.queue_capacity == 0 {
            return Err(CaptureError::Config("queue_capacity must be at least 1".into()));
        }
        if self.max_surfaces == 0 {
            return Err(CaptureError::Config("max_surfaces must be at least 1".into()));
        }
        Ok(())
    }

    /// Output extent for an input extent, saturating on overflow.
    pub fn output_extent(&self, width: u32, height: u32) -> (u32, u32) {
        (
            width.saturating_mul(self.scale_factor),
            height.saturating_mul(self.scale_factor),
        )
    }
}

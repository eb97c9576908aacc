//! Domain types shared by the capture layer and the upscale pipeline.

use std::fmt;
use std::str::FromStr;

use num_derive::FromPrimitive;
use serde::{de, Deserialize, Deserializer};

use crate::error::CaptureError;

/// Opaque identifier of a presentable surface (a swapchain).
///
/// Owned by the driver; only used as a lookup key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u64);

/// Opaque identifier of one backing image of a surface, or of a scratch
/// image owned by a frame bridge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageHandle(pub u64);

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "swapchain:{:#x}", self.0)
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image:{:#x}", self.0)
    }
}

/// Which compute stages run for a frame.
///
/// Configuration accepts either a name or one of these numeric codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive)]
pub enum UpscaleMode {
    SpatialOnly = 0,
    NeuralOnly = 1,
    Hybrid = 2,
}

impl UpscaleMode {
    pub fn runs_spatial(self) -> bool {
        matches!(self, UpscaleMode::SpatialOnly | UpscaleMode::Hybrid)
    }

    pub fn runs_neural(self) -> bool {
        matches!(self, UpscaleMode::NeuralOnly | UpscaleMode::Hybrid)
    }
}

impl FromStr for UpscaleMode {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u32>() {
            return num_traits::FromPrimitive::from_u32(code)
                .ok_or_else(|| CaptureError::Config(format!("unknown upscale mode code {code}")));
        }
        match s.to_ascii_lowercase().as_str() {
            "spatial" | "spatial_only" | "fsr" | "fsr_only" => Ok(UpscaleMode::SpatialOnly),
            "neural" | "neural_only" => Ok(UpscaleMode::NeuralOnly),
            "hybrid" => Ok(UpscaleMode::Hybrid),
            other => Err(CaptureError::Config(format!("unknown upscale mode '{other}'"))),
        }
    }
}

impl<'de> Deserialize<'de> for UpscaleMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => num_traits::FromPrimitive::from_u64(code)
                .ok_or_else(|| de::Error::custom(format!("unknown upscale mode code {code}"))),
            Raw::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

impl fmt::Display for UpscaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpscaleMode::SpatialOnly => "spatial_only",
            UpscaleMode::NeuralOnly => "neural_only",
            UpscaleMode::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Where the pipeline runs relative to the presenting thread.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Inline on the presenting thread; present blocks until the pipeline returns.
    #[default]
    Synchronous,
    /// Queued to a dedicated worker thread.
    Pipelined,
}

impl FromStr for DispatchMode {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "synchronous" | "inline" => Ok(DispatchMode::Synchronous),
            "pipelined" | "queued" | "worker" => Ok(DispatchMode::Pipelined),
            other => Err(CaptureError::Config(format!("unknown dispatch mode '{other}'"))),
        }
    }
}

/// One unit of upscale work, built per intercepted (surface, index) pair.
///
/// Consumed exactly once by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameJob {
    pub surface: SurfaceHandle,
    pub image_index: u32,
    pub image: ImageHandle,
    pub width: u32,
    pub height: u32,
    pub mode: UpscaleMode,
    /// Strictly increasing per surface, starting at 1.
    pub sequence: u64,
}

//! Spatial upscale collaborator contract.

use anyhow::Result;
use present_core::ImageHandle;

/// Viewport, input and output extents for one spatial dispatch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SpatialExtents {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub input_width: u32,
    pub input_height: u32,
    pub output_width: u32,
    pub output_height: u32,
}

impl SpatialExtents {
    /// Full-frame upscale: the viewport covers the whole input.
    pub fn full_frame(input: (u32, u32), output: (u32, u32)) -> Self {
        Self {
            viewport_width: input.0,
            viewport_height: input.1,
            input_width: input.0,
            input_height: input.1,
            output_width: output.0,
            output_height: output.1,
        }
    }
}

/// Kernel constants produced by [`SpatialUpscaler::compute_constants`].
///
/// Opaque to the pipeline; handed back unchanged to
/// [`SpatialUpscaler::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpatialConstants(pub Box<[u8]>);

impl SpatialConstants {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A non-learned, kernel-based resolution-increasing filter.
pub trait SpatialUpscaler: Send {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Compute the kernel constants for the given extents and sharpness.
    fn compute_constants(&self, extents: &SpatialExtents, sharpness: f32) -> Result<SpatialConstants>;

    /// Upscale `input` into `output`.
    fn dispatch(&mut self, constants: &SpatialConstants, input: ImageHandle, output: ImageHandle) -> Result<()>;
}

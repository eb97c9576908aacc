//! Neural inference collaborator contract.

use anyhow::Result;
use present_core::{ImageHandle, ModelPaths};

/// A learned-model image enhancement pass.
///
/// [`load_model`](NeuralUpscaler::load_model) is called once at startup; an
/// error there marks the neural stage unavailable for the process lifetime.
pub trait NeuralUpscaler: Send {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    fn load_model(&mut self, paths: &ModelPaths) -> Result<()>;

    /// Run the model on `input`, writing to `output`. `width`/`height` are the
    /// extent of `input`.
    fn infer(&mut self, input: ImageHandle, output: ImageHandle, width: u32, height: u32) -> Result<()>;
}

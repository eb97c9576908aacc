//! Common interface for scratch output images and write-back.

use anyhow::Result;
use present_core::{ImageHandle, SurfaceHandle};

/// Per-surface pair of scratch output images plus commit back to the
/// presented image.
///
/// The spatial stage writes its base result to [`base_image`], the neural
/// stage refines into [`refine_image`]. Only a fully produced image is ever
/// passed to [`commit`], so the presented image never sees a half-written
/// buffer.
///
/// [`base_image`]: FrameBridge::base_image
/// [`refine_image`]: FrameBridge::refine_image
/// [`commit`]: FrameBridge::commit
pub trait FrameBridge: Send {
    /// Recreate the scratch images if the output dimensions changed.
    fn ensure_dimensions(&mut self, width: u32, height: u32) -> Result<()>;

    /// Scratch image holding the spatial stage output.
    fn base_image(&self) -> Option<ImageHandle>;

    /// Scratch image holding the neural stage output.
    fn refine_image(&self) -> Option<ImageHandle>;

    /// Copy `enhanced` over the presented image.
    ///
    /// Returns `false` if the copy could not be submitted, in which case the
    /// presented image is untouched.
    fn commit(&mut self, enhanced: ImageHandle, presented: ImageHandle) -> bool;

    /// Release all scratch resources.
    fn cleanup(&mut self);

    /// Current dimensions of the scratch images.
    fn dimensions(&self) -> (u32, u32);

    /// Called once per job, before any stage runs. Sequences grow strictly
    /// per surface, so a backend can use them as timeline semaphore values.
    fn begin_frame(&mut self, _sequence: u64) {}
}

/// Creates a [`FrameBridge`] the first time a surface reaches the pipeline.
pub trait BridgeFactory: Send + Sync {
    fn create(&self, surface: SurfaceHandle) -> Result<Box<dyn FrameBridge>>;
}

impl<F> BridgeFactory for F
where
    F: Fn(SurfaceHandle) -> Result<Box<dyn FrameBridge>> + Send + Sync,
{
    fn create(&self, surface: SurfaceHandle) -> Result<Box<dyn FrameBridge>> {
        self(surface)
    }
}

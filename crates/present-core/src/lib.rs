//! Host-facing vocabulary for present-call interception.
//!
//! - [`ffi`] describes the raw driver structs the detours receive.
//! - [`inputs`] turns those raw arguments into safe views.
//! - [`types`] holds the handles, modes and [`FrameJob`] the core passes around.
//! - [`config`] and [`log`] resolve settings and install logging at attach.

pub mod config;
pub mod error;
pub mod ffi;
pub mod inputs;
pub mod log;
pub mod types;

pub use config::{ModelPaths, UpscaleConfig};
pub use error::CaptureError;
pub use inputs::{CreatedSurface, PresentRequest, PresentTarget};
pub use types::{DispatchMode, FrameJob, ImageHandle, SurfaceHandle, UpscaleMode};

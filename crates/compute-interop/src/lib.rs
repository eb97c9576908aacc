//! Collaborator contracts for the capture layer.
//!
//! This crate defines the seams between the decision layer and the things it
//! coordinates: [`FrameBridge`] for scratch images and write-back,
//! [`SpatialUpscaler`] and [`NeuralUpscaler`] for the two compute stages, and
//! [`RedirectFacility`] for function interception. [`DriverLoader`] is the one
//! concrete piece: it finds the graphics loader and its entry points at
//! runtime.

pub mod bridge;
pub mod loader;
pub mod neural;
pub mod redirect;
pub mod spatial;

pub use bridge::{BridgeFactory, FrameBridge};
pub use loader::DriverLoader;
pub use neural::NeuralUpscaler;
pub use redirect::{EntryKind, FnAddr, RedirectFacility};
pub use spatial::{SpatialConstants, SpatialExtents, SpatialUpscaler};

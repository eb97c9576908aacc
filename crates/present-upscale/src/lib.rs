//! Frame interception and hybrid upscale orchestration.
//!
//! This crate ties together [`present_core`] (driver vocabulary, config and
//! logging) and [`compute_interop`] (collaborator contracts) into the layer
//! that sits between "a frame is about to be shown" and "an enhanced frame is
//! shown instead".
//!
//! # Overview
//!
//! - [`SurfaceRegistry`] tracks presentable surfaces and their images.
//! - [`Dispatcher`] is the per-present decision point; it always forwards the
//!   original call exactly once.
//! - [`HybridPipeline`] runs the spatial and neural stages with fallbacks.
//! - [`FrameHandoff`] is the bounded queue used by pipelined dispatch.
//! - [`CaptureContext`] owns all of the above plus the installed hooks.
//! - [`initialize`] and [`shutdown`] are the attach/detach entry points.

pub mod context;
pub mod detours;
pub mod dispatch;
pub mod handoff;
pub mod hooks;
pub mod lifecycle;
pub mod pipeline;
pub mod registry;

pub use context::{CaptureContext, Collaborators};
pub use dispatch::{Dispatcher, PresentDecision};
pub use handoff::{FrameHandoff, HandoffError};
pub use hooks::{HookTable, Originals};
pub use lifecycle::{initialize, initialize_with_targets, shutdown};
pub use pipeline::{
    effective_mode, FrameOutcome, HybridPipeline, PassReason, PipelineSettings, PipelineStats, StageAvailability,
    StatsSnapshot,
};
pub use registry::{SurfaceRecord, SurfaceRegistry};

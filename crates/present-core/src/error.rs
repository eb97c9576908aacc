//! Error taxonomy for the capture layer.
//!
//! Collaborator code returns `anyhow::Result`; these variants classify what
//! went wrong so the dispatcher can pick the right fallback.

use crate::types::SurfaceHandle;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    // ── Interception ─────────────────────────────────────────────────
    #[error("interception facility failed to initialize: {0}")]
    FacilityInit(String),

    #[error("interception target not found: {0}")]
    TargetNotFound(String),

    #[error("failed to install redirect for {entry}: {reason}")]
    HookInstall { entry: &'static str, reason: String },

    // ── Compute ──────────────────────────────────────────────────────
    #[error("{0} backend unavailable")]
    BackendUnavailable(&'static str),

    #[error("{stage} stage failed: {reason}")]
    StageFailed { stage: &'static str, reason: String },

    // ── Per-call misses ──────────────────────────────────────────────
    #[error("unknown surface {0}")]
    UnknownSurface(SurfaceHandle),

    #[error("image index {index} out of range for {surface} ({count} images)")]
    ImageIndexOutOfRange {
        surface: SurfaceHandle,
        index: u32,
        count: usize,
    },

    // ── Handoff ──────────────────────────────────────────────────────
    #[error("frame handoff queue is full")]
    HandoffFull,

    #[error("frame handoff queue is closed")]
    HandoffClosed,

    // ── Configuration ────────────────────────────────────────────────
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CaptureError {
    /// Everything except a failed facility bootstrap leaves the host running
    /// with capture degraded or skipped for one call.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CaptureError::FacilityInit(_))
    }
}

pub type Result<T, E = CaptureError> = std::result::Result<T, E>;

//! Attach and detach entry points.
//!
//! The redirected driver calls arrive through plain `extern` functions with no
//! user pointer, so the live [`CaptureContext`] sits in a single active slot.
//! A context that has been shut down stays in the slot: its originals remain
//! reachable for any call already inside a detour.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use compute_interop::{DriverLoader, EntryKind, FnAddr};
use once_cell::sync::Lazy;
use present_core::{log::init_logging, CaptureError, UpscaleConfig};
use tracing::{debug, error, info, warn};

use crate::context::{CaptureContext, Collaborators};
use crate::detours;
use crate::pipeline::StatsSnapshot;

static ACTIVE: Lazy<RwLock<Option<Arc<CaptureContext>>>> = Lazy::new(|| RwLock::new(None));

/// The context the detours should use, if one was ever installed.
pub fn active() -> Option<Arc<CaptureContext>> {
    ACTIVE.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Resolve configuration from the environment, falling back to defaults.
pub fn config_from_env() -> UpscaleConfig {
    match UpscaleConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring configuration: {e:#}");
            UpscaleConfig::default()
        }
    }
}

/// Locate the graphics loader and intercept its entry points.
///
/// Returns `false` when capture could not be brought up; the host keeps
/// running either way.
pub fn initialize(config: UpscaleConfig, collaborators: Collaborators) -> bool {
    init_logging();
    let loader = match DriverLoader::open() {
        Ok(loader) => loader,
        Err(e) => {
            warn!("{}", CaptureError::TargetNotFound(format!("{e:#}")));
            return false;
        }
    };
    let targets = loader.entry_points();
    activate(config, collaborators, targets, Some(loader))
}

/// [`initialize`] with entry points the host already resolved.
pub fn initialize_with_targets(
    config: UpscaleConfig,
    collaborators: Collaborators,
    targets: HashMap<EntryKind, FnAddr>,
) -> bool {
    init_logging();
    activate(config, collaborators, targets, None)
}

fn activate(
    config: UpscaleConfig,
    collaborators: Collaborators,
    targets: HashMap<EntryKind, FnAddr>,
    loader: Option<DriverLoader>,
) -> bool {
    let mut slot = ACTIVE.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(current) = slot.as_ref() {
        if !current.is_shut_down() {
            debug!("Capture already initialized");
            return true;
        }
    }

    let config = match config.validate() {
        Ok(()) => config,
        Err(e) => {
            warn!("{e}; using defaults");
            UpscaleConfig::default()
        }
    };
    let context = match CaptureContext::new(config, collaborators) {
        Ok(context) => Arc::new(context),
        Err(e) => {
            error!("{e}; capture disabled for this process");
            return false;
        }
    };
    if let Some(loader) = loader {
        context.retain_loader(loader);
    }

    // Published before installing so the first redirected call finds it.
    *slot = Some(Arc::clone(&context));
    drop(slot);

    // SAFETY: targets come from the loader (or the host) for exactly the
    // entry points the detours are declared for.
    let installed = unsafe { context.install_hooks(&targets, detours::detour_for) };
    if installed == 0 {
        warn!("No entry point could be intercepted");
        context.shutdown();
        return false;
    }
    info!(
        "Capture initialized: {installed}/{} entry points, {:?} dispatch",
        EntryKind::ALL.len(),
        context.dispatcher().dispatch_mode()
    );
    true
}

/// Drain, unhook and clear. Safe to call more than once.
pub fn shutdown() {
    match active() {
        Some(context) => context.shutdown(),
        None => debug!("Shutdown without an active capture context"),
    }
}

/// Decision counters of the active context.
pub fn stats() -> Option<StatsSnapshot> {
    active().map(|context| context.stats())
}

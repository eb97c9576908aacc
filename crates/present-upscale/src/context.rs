//! Process-scoped capture state.
//!
//! One [`CaptureContext`] is built at attach and owns everything the detours
//! need: the dispatcher (with the surface registry and pipeline), the hook
//! table and the published originals. Stage availability is probed here, once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use compute_interop::{
    BridgeFactory, DriverLoader, EntryKind, FnAddr, NeuralUpscaler, RedirectFacility, SpatialUpscaler,
};
use present_core::{CaptureError, ModelPaths, UpscaleConfig};
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::hooks::{HookTable, Originals};
use crate::pipeline::{effective_mode, HybridPipeline, PipelineSettings, PipelineStats, StageAvailability, StatsSnapshot};
use crate::registry::SurfaceRegistry;

/// Everything the capture layer coordinates but does not implement.
pub struct Collaborators {
    pub facility: Box<dyn RedirectFacility>,
    /// `None` when no spatial backend exists on this machine.
    pub spatial: Option<Box<dyn SpatialUpscaler>>,
    /// Probed with `load_model` before use.
    pub neural: Option<Box<dyn NeuralUpscaler>>,
    pub bridges: Box<dyn BridgeFactory>,
}

pub struct CaptureContext {
    config: UpscaleConfig,
    availability: StageAvailability,
    dispatcher: Dispatcher,
    hooks: Mutex<HookTable>,
    originals: Originals,
    /// Keeps the loader mapped while redirects into it may be live.
    loader: Mutex<Option<DriverLoader>>,
    shut_down: AtomicBool,
}

impl CaptureContext {
    /// Bring up the redirect facility and negotiate the compute stages.
    ///
    /// Fails only if the facility itself cannot initialize.
    pub fn new(config: UpscaleConfig, collaborators: Collaborators) -> Result<Self, CaptureError> {
        let Collaborators {
            facility,
            spatial,
            neural,
            bridges,
        } = collaborators;
        let hooks = HookTable::new(facility)?;

        if spatial.is_none() {
            warn!("{}", CaptureError::BackendUnavailable("spatial"));
        }
        let neural = probe_neural(neural, &config.model);
        let availability = StageAvailability {
            spatial: spatial.is_some(),
            neural: neural.is_some(),
        };
        match effective_mode(config.mode, availability) {
            Some(mode) if mode != config.mode => {
                warn!("Requested {} mode narrowed to {mode}", config.mode)
            }
            Some(mode) => info!("Upscale mode {mode}, factor {}x", config.scale_factor),
            None => warn!("No compute stage available; every frame passes through"),
        }

        let pipeline = HybridPipeline::new(
            PipelineSettings::from(&config),
            spatial,
            neural,
            bridges,
            Arc::new(PipelineStats::default()),
        );
        let dispatcher = Dispatcher::new(
            SurfaceRegistry::new(config.max_surfaces),
            pipeline,
            config.mode,
            config.dispatch,
            config.queue_capacity,
        );

        Ok(Self {
            config,
            availability,
            dispatcher,
            hooks: Mutex::new(hooks),
            originals: Originals::default(),
            loader: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        })
    }

    fn hooks(&self) -> MutexGuard<'_, HookTable> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &UpscaleConfig {
        &self.config
    }

    pub fn availability(&self) -> StageAvailability {
        self.availability
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.dispatcher.stats().snapshot()
    }

    /// Callable address of the original entry point, once redirected.
    pub fn original(&self, kind: EntryKind) -> Option<FnAddr> {
        self.originals.get(kind)
    }

    pub fn installed_count(&self) -> usize {
        self.hooks().installed_count()
    }

    pub(crate) fn retain_loader(&self, loader: DriverLoader) {
        debug!("Holding graphics loader {}", loader.name());
        *self.loader.lock().unwrap_or_else(PoisonError::into_inner) = Some(loader);
    }

    /// Redirect every entry point found in `targets`, returning how many are
    /// live afterwards.
    ///
    /// Missing targets and failed installs are skipped; hooks installed
    /// before a failure stay active.
    ///
    /// # Safety
    ///
    /// Each address in `targets` must be the live entry point whose ABI
    /// matches the detour returned by `detour` for that kind.
    pub unsafe fn install_hooks(
        &self,
        targets: &HashMap<EntryKind, FnAddr>,
        detour: impl Fn(EntryKind) -> Option<FnAddr>,
    ) -> usize {
        let mut hooks = self.hooks();
        for kind in EntryKind::ALL {
            let Some(&target) = targets.get(&kind) else {
                warn!("{}", CaptureError::TargetNotFound(kind.name().to_string()));
                continue;
            };
            let Some(replacement) = detour(kind) else {
                continue;
            };
            match unsafe { hooks.install(kind, target, replacement) } {
                Ok(original) => self.originals.publish(kind, original),
                Err(e) => warn!("{e}"),
            }
        }
        hooks.installed_count()
    }

    /// Drain pending work, then remove every redirect. A second call does
    /// nothing.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.dispatcher.shutdown();
        self.hooks().uninstall_all();
        let snapshot = self.stats();
        info!(
            "Capture stopped: {} enhanced, {} neural fallbacks, {} spatial failures, {} passed through",
            snapshot.enhanced, snapshot.neural_degraded, snapshot.spatial_failed, snapshot.passthrough
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

/// Load the model once; any failure disables the neural stage for good.
fn probe_neural(neural: Option<Box<dyn NeuralUpscaler>>, paths: &ModelPaths) -> Option<Box<dyn NeuralUpscaler>> {
    let Some(mut neural) = neural else {
        warn!("{}", CaptureError::BackendUnavailable("neural"));
        return None;
    };
    match neural.load_model(paths) {
        Ok(()) => {
            info!("Neural stage {} loaded {}", neural.name(), paths.weights.display());
            Some(neural)
        }
        Err(e) => {
            warn!("Neural stage {} unavailable: {e:#}", neural.name());
            None
        }
    }
}

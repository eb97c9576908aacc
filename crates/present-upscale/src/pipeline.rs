//! Hybrid upscale pipeline: decides which compute stages run for a frame,
//! in what order, and what gets committed when a stage fails.
//!
//! # Stage order
//!
//! ```text
//! HYBRID:        presented ──spatial──► base ──neural──► refine ──commit──► presented
//! SPATIAL_ONLY:  presented ──spatial──► base ──commit──► presented
//! NEURAL_ONLY:   presented ──neural───► refine ──commit──► presented
//! ```
//!
//! # Fallbacks
//!
//! - Neural failure after a spatial pass commits the spatial base unchanged.
//! - Neural failure in `NEURAL_ONLY` runs the spatial stage instead, if it
//!   is available.
//! - Spatial failure commits nothing: the frame is presented as-is.
//! - Nothing is committed unless the stage that produced it returned `Ok`,
//!   so a half-written scratch image never reaches the presented image.
//!
//! Stage availability is negotiated once at startup; a requested mode whose
//! stages are missing is narrowed by [`effective_mode`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use compute_interop::{BridgeFactory, FrameBridge, NeuralUpscaler, SpatialExtents, SpatialUpscaler};
use present_core::{FrameJob, ImageHandle, SurfaceHandle, UpscaleConfig, UpscaleMode};
use tracing::{debug, trace, warn};

// ─── Outcome ────────────────────────────────────────────────────────────────

/// Why a frame was presented without enhancement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PassReason {
    /// Surface unknown to the registry.
    UnknownSurface,
    /// Presented index not among the registered images.
    IndexOutOfRange,
    /// No compute stage is available for the requested mode.
    NoStageAvailable,
    /// Scratch images could not be created or sized.
    BridgeUnavailable,
    SpatialFailed,
    /// Neural failed with no spatial output to fall back on.
    NeuralFailed,
    /// The enhanced image could not be copied over the presented one.
    CommitFailed,
    /// A job arrived with a sequence number not above the last one seen.
    OutOfOrder,
    /// Pipelined mode could not queue the job.
    QueueRejected,
    /// Capture has been shut down.
    Stopped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// `image` was committed over the presented image. `ran` is the mode
    /// that actually produced it, which is narrower than the requested mode
    /// after a fallback.
    Enhanced { image: ImageHandle, ran: UpscaleMode },
    PassThrough(PassReason),
}

impl FrameOutcome {
    pub fn is_enhanced(&self) -> bool {
        matches!(self, FrameOutcome::Enhanced { .. })
    }
}

/// Warn once per surface and reason, then drop to debug.
#[derive(Debug, Default)]
pub(crate) struct PassLog {
    warned: HashSet<(SurfaceHandle, PassReason)>,
}

impl PassLog {
    pub(crate) fn note(&mut self, surface: SurfaceHandle, reason: PassReason) {
        if self.warned.insert((surface, reason)) {
            warn!("{surface}: presenting unenhanced ({reason:?})");
        } else {
            debug!("{surface}: presenting unenhanced ({reason:?})");
        }
    }

    pub(crate) fn forget(&mut self, surface: SurfaceHandle) {
        self.warned.retain(|(s, _)| *s != surface);
    }

    pub(crate) fn clear(&mut self) {
        self.warned.clear();
    }
}

// ─── Stats ──────────────────────────────────────────────────────────────────

/// Decision counters shared by the dispatcher and the pipeline.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub enhanced: AtomicU64,
    /// Frames that fell back from the neural stage to spatial output.
    pub neural_degraded: AtomicU64,
    pub spatial_failed: AtomicU64,
    pub passthrough: AtomicU64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub enhanced: u64,
    pub neural_degraded: u64,
    pub spatial_failed: u64,
    pub passthrough: u64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enhanced: self.enhanced.load(Ordering::Relaxed),
            neural_degraded: self.neural_degraded.load(Ordering::Relaxed),
            spatial_failed: self.spatial_failed.load(Ordering::Relaxed),
            passthrough: self.passthrough.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record(&self, outcome: &FrameOutcome) {
        let counter = match outcome {
            FrameOutcome::Enhanced { .. } => &self.enhanced,
            FrameOutcome::PassThrough(_) => &self.passthrough,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ─── Mode negotiation ───────────────────────────────────────────────────────

/// Which stages survived startup probing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StageAvailability {
    pub spatial: bool,
    pub neural: bool,
}

/// Narrow `requested` to the stages that are actually available.
///
/// `None` means nothing can run and every frame passes through.
pub fn effective_mode(requested: UpscaleMode, available: StageAvailability) -> Option<UpscaleMode> {
    match (requested, available.spatial, available.neural) {
        (UpscaleMode::Hybrid, true, true) => Some(UpscaleMode::Hybrid),
        (UpscaleMode::Hybrid, true, false) => Some(UpscaleMode::SpatialOnly),
        (UpscaleMode::Hybrid, false, true) => Some(UpscaleMode::NeuralOnly),
        (UpscaleMode::SpatialOnly, true, _) => Some(UpscaleMode::SpatialOnly),
        (UpscaleMode::NeuralOnly, _, true) => Some(UpscaleMode::NeuralOnly),
        (UpscaleMode::NeuralOnly, true, false) => Some(UpscaleMode::SpatialOnly),
        _ => None,
    }
}

// ─── Pipeline ───────────────────────────────────────────────────────────────

/// Settings the pipeline reads per frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PipelineSettings {
    pub scale_factor: u32,
    pub sharpness: f32,
}

impl From<&UpscaleConfig> for PipelineSettings {
    fn from(config: &UpscaleConfig) -> Self {
        Self {
            scale_factor: config.scale_factor,
            sharpness: config.sharpness,
        }
    }
}

pub struct HybridPipeline {
    settings: PipelineSettings,
    spatial: Option<Box<dyn SpatialUpscaler>>,
    neural: Option<Box<dyn NeuralUpscaler>>,
    bridge_factory: Box<dyn BridgeFactory>,
    bridges: HashMap<SurfaceHandle, Box<dyn FrameBridge>>,
    /// Surfaces whose bridge could not be created; not retried until forgotten.
    bridgeless: HashSet<SurfaceHandle>,
    last_sequence: HashMap<SurfaceHandle, u64>,
    passes: PassLog,
    stats: Arc<PipelineStats>,
}

impl HybridPipeline {
    /// Build from already-probed stages: `None` means that stage is
    /// unavailable for the process lifetime.
    pub fn new(
        settings: PipelineSettings,
        spatial: Option<Box<dyn SpatialUpscaler>>,
        neural: Option<Box<dyn NeuralUpscaler>>,
        bridge_factory: Box<dyn BridgeFactory>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            settings,
            spatial,
            neural,
            bridge_factory,
            bridges: HashMap::new(),
            bridgeless: HashSet::new(),
            last_sequence: HashMap::new(),
            passes: PassLog::default(),
            stats,
        }
    }

    pub fn availability(&self) -> StageAvailability {
        StageAvailability {
            spatial: self.spatial.is_some(),
            neural: self.neural.is_some(),
        }
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Run one job to completion or to a defined fallback. Never fails.
    pub fn process(&mut self, job: &FrameJob) -> FrameOutcome {
        let outcome = self.run(job);
        self.stats.record(&outcome);
        match outcome {
            FrameOutcome::Enhanced { image, ran } => {
                trace!(surface = %job.surface, seq = job.sequence, %image, %ran, "Frame enhanced");
            }
            FrameOutcome::PassThrough(reason) => self.passes.note(job.surface, reason),
        }
        outcome
    }

    fn run(&mut self, job: &FrameJob) -> FrameOutcome {
        let last = self.last_sequence.entry(job.surface).or_insert(0);
        if job.sequence <= *last {
            return FrameOutcome::PassThrough(PassReason::OutOfOrder);
        }
        *last = job.sequence;

        let Some(mode) = effective_mode(job.mode, self.availability()) else {
            return FrameOutcome::PassThrough(PassReason::NoStageAvailable);
        };
        if !self.ensure_bridge(job.surface) {
            return FrameOutcome::PassThrough(PassReason::BridgeUnavailable);
        }

        let Self {
            settings,
            spatial,
            neural,
            bridges,
            stats,
            ..
        } = self;
        let Some(bridge) = bridges.get_mut(&job.surface) else {
            return FrameOutcome::PassThrough(PassReason::BridgeUnavailable);
        };

        let output = (
            job.width.saturating_mul(settings.scale_factor),
            job.height.saturating_mul(settings.scale_factor),
        );
        if let Err(e) = bridge.ensure_dimensions(output.0, output.1) {
            debug!("{}: scratch resize to {}x{} failed: {e:#}", job.surface, output.0, output.1);
            return FrameOutcome::PassThrough(PassReason::BridgeUnavailable);
        }
        bridge.begin_frame(job.sequence);

        let sharpness = settings.sharpness;
        let (image, ran) = match mode {
            UpscaleMode::SpatialOnly => match run_spatial(spatial, &**bridge, job, output, sharpness) {
                Ok(base) => (base, UpscaleMode::SpatialOnly),
                Err(e) => return spatial_failed(stats, job, e),
            },
            UpscaleMode::Hybrid => {
                let base = match run_spatial(spatial, &**bridge, job, output, sharpness) {
                    Ok(base) => base,
                    Err(e) => return spatial_failed(stats, job, e),
                };
                match run_neural(neural, &**bridge, base, output) {
                    Ok(refined) => (refined, UpscaleMode::Hybrid),
                    Err(e) => {
                        debug!(
                            "{} seq {}: neural refine failed, keeping spatial base: {e:#}",
                            job.surface, job.sequence
                        );
                        stats.neural_degraded.fetch_add(1, Ordering::Relaxed);
                        (base, UpscaleMode::SpatialOnly)
                    }
                }
            }
            UpscaleMode::NeuralOnly => {
                match run_neural(neural, &**bridge, job.image, (job.width, job.height)) {
                    Ok(refined) => (refined, UpscaleMode::NeuralOnly),
                    Err(e) => {
                        debug!("{} seq {}: neural pass failed: {e:#}", job.surface, job.sequence);
                        if spatial.is_none() {
                            return FrameOutcome::PassThrough(PassReason::NeuralFailed);
                        }
                        match run_spatial(spatial, &**bridge, job, output, sharpness) {
                            Ok(base) => {
                                stats.neural_degraded.fetch_add(1, Ordering::Relaxed);
                                (base, UpscaleMode::SpatialOnly)
                            }
                            Err(e) => return spatial_failed(stats, job, e),
                        }
                    }
                }
            }
        };

        if !bridge.commit(image, job.image) {
            return FrameOutcome::PassThrough(PassReason::CommitFailed);
        }
        FrameOutcome::Enhanced { image, ran }
    }

    /// Make sure a bridge exists for `surface`, creating it on first use.
    fn ensure_bridge(&mut self, surface: SurfaceHandle) -> bool {
        if self.bridges.contains_key(&surface) {
            return true;
        }
        if self.bridgeless.contains(&surface) {
            return false;
        }
        match self.bridge_factory.create(surface) {
            Ok(bridge) => {
                debug!("Created frame bridge for {surface}");
                self.bridges.insert(surface, bridge);
                true
            }
            Err(e) => {
                warn!("Failed to create frame bridge for {surface}: {e:#}");
                self.bridgeless.insert(surface);
                false
            }
        }
    }

    /// Release per-surface state after the surface is destroyed.
    pub fn forget_surface(&mut self, surface: SurfaceHandle) {
        if let Some(mut bridge) = self.bridges.remove(&surface) {
            bridge.cleanup();
        }
        self.bridgeless.remove(&surface);
        self.last_sequence.remove(&surface);
        self.passes.forget(surface);
    }

    /// Release every bridge.
    pub fn shutdown(&mut self) {
        for (surface, mut bridge) in self.bridges.drain() {
            debug!("Releasing frame bridge for {surface}");
            bridge.cleanup();
        }
        self.bridgeless.clear();
        self.last_sequence.clear();
        self.passes.clear();
    }
}

fn spatial_failed(stats: &PipelineStats, job: &FrameJob, e: anyhow::Error) -> FrameOutcome {
    debug!("{} seq {}: spatial pass failed: {e:#}", job.surface, job.sequence);
    stats.spatial_failed.fetch_add(1, Ordering::Relaxed);
    FrameOutcome::PassThrough(PassReason::SpatialFailed)
}

fn run_spatial(
    spatial: &mut Option<Box<dyn SpatialUpscaler>>,
    bridge: &dyn FrameBridge,
    job: &FrameJob,
    output: (u32, u32),
    sharpness: f32,
) -> Result<ImageHandle> {
    let spatial = spatial.as_deref_mut().ok_or_else(|| anyhow!("spatial stage unavailable"))?;
    let base = bridge.base_image().ok_or_else(|| anyhow!("no base scratch image"))?;
    let extents = SpatialExtents::full_frame((job.width, job.height), output);
    let constants = spatial.compute_constants(&extents, sharpness)?;
    spatial.dispatch(&constants, job.image, base)?;
    Ok(base)
}

fn run_neural(
    neural: &mut Option<Box<dyn NeuralUpscaler>>,
    bridge: &dyn FrameBridge,
    input: ImageHandle,
    extent: (u32, u32),
) -> Result<ImageHandle> {
    let neural = neural.as_deref_mut().ok_or_else(|| anyhow!("neural stage unavailable"))?;
    let refine = bridge.refine_image().ok_or_else(|| anyhow!("no refine scratch image"))?;
    neural.infer(input, refine, extent.0, extent.1)?;
    Ok(refine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute_interop::SpatialConstants;
    use std::sync::Mutex;

    const BASE: ImageHandle = ImageHandle(0xb0);
    const REFINE: ImageHandle = ImageHandle(0xc0);

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Constants(SpatialExtents),
        Spatial { input: ImageHandle, output: ImageHandle },
        Neural { input: ImageHandle, output: ImageHandle, width: u32, height: u32 },
        Commit { enhanced: ImageHandle, presented: ImageHandle },
    }

    type Log = Arc<Mutex<Vec<Call>>>;

    struct MockSpatial {
        log: Log,
        fail: bool,
    }

    impl SpatialUpscaler for MockSpatial {
        fn name(&self) -> &str {
            "mock-spatial"
        }

        fn compute_constants(&self, extents: &SpatialExtents, _sharpness: f32) -> Result<SpatialConstants> {
            self.log.lock().unwrap().push(Call::Constants(*extents));
            Ok(SpatialConstants(vec![1, 2, 3].into_boxed_slice()))
        }

        fn dispatch(&mut self, constants: &SpatialConstants, input: ImageHandle, output: ImageHandle) -> Result<()> {
            assert_eq!(constants.as_bytes(), &[1, 2, 3]);
            self.log.lock().unwrap().push(Call::Spatial { input, output });
            if self.fail {
                anyhow::bail!("kernel dispatch rejected");
            }
            Ok(())
        }
    }

    struct MockNeural {
        log: Log,
        fail: bool,
    }

    impl NeuralUpscaler for MockNeural {
        fn name(&self) -> &str {
            "mock-neural"
        }

        fn load_model(&mut self, _paths: &present_core::ModelPaths) -> Result<()> {
            Ok(())
        }

        fn infer(&mut self, input: ImageHandle, output: ImageHandle, width: u32, height: u32) -> Result<()> {
            self.log.lock().unwrap().push(Call::Neural { input, output, width, height });
            if self.fail {
                anyhow::bail!("inference session lost");
            }
            Ok(())
        }
    }

    struct MockBridge {
        log: Log,
        size: (u32, u32),
    }

    impl FrameBridge for MockBridge {
        fn ensure_dimensions(&mut self, width: u32, height: u32) -> Result<()> {
            self.size = (width, height);
            Ok(())
        }

        fn base_image(&self) -> Option<ImageHandle> {
            Some(BASE)
        }

        fn refine_image(&self) -> Option<ImageHandle> {
            Some(REFINE)
        }

        fn commit(&mut self, enhanced: ImageHandle, presented: ImageHandle) -> bool {
            self.log.lock().unwrap().push(Call::Commit { enhanced, presented });
            true
        }

        fn cleanup(&mut self) {}

        fn dimensions(&self) -> (u32, u32) {
            self.size
        }
    }

    struct Setup {
        spatial: Option<bool>,
        neural: Option<bool>,
    }

    fn pipeline(setup: Setup, log: &Log) -> HybridPipeline {
        let spatial = setup.spatial.map(|fail| {
            Box::new(MockSpatial {
                log: Arc::clone(log),
                fail,
            }) as Box<dyn SpatialUpscaler>
        });
        let neural = setup.neural.map(|fail| {
            Box::new(MockNeural {
                log: Arc::clone(log),
                fail,
            }) as Box<dyn NeuralUpscaler>
        });
        let bridge_log = Arc::clone(log);
        let factory = move |_surface: SurfaceHandle| -> Result<Box<dyn FrameBridge>> {
            Ok(Box::new(MockBridge {
                log: Arc::clone(&bridge_log),
                size: (0, 0),
            }))
        };
        HybridPipeline::new(
            PipelineSettings {
                scale_factor: 2,
                sharpness: 0.2,
            },
            spatial,
            neural,
            Box::new(factory),
            Arc::default(),
        )
    }

    fn job(mode: UpscaleMode, sequence: u64) -> FrameJob {
        FrameJob {
            surface: SurfaceHandle(0x51),
            image_index: 1,
            image: ImageHandle(0x12),
            width: 1920,
            height: 1080,
            mode,
            sequence,
        }
    }

    #[test]
    fn hybrid_runs_spatial_then_neural_on_the_base() {
        let log = Log::default();
        let mut pipeline = pipeline(
            Setup {
                spatial: Some(false),
                neural: Some(false),
            },
            &log,
        );

        let outcome = pipeline.process(&job(UpscaleMode::Hybrid, 1));
        assert_eq!(
            outcome,
            FrameOutcome::Enhanced {
                image: REFINE,
                ran: UpscaleMode::Hybrid
            }
        );
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                Call::Constants(SpatialExtents::full_frame((1920, 1080), (3840, 2160))),
                Call::Spatial {
                    input: ImageHandle(0x12),
                    output: BASE
                },
                Call::Neural {
                    input: BASE,
                    output: REFINE,
                    width: 3840,
                    height: 2160
                },
                Call::Commit {
                    enhanced: REFINE,
                    presented: ImageHandle(0x12)
                },
            ]
        );
        assert_eq!(pipeline.stats().snapshot().enhanced, 1);
    }

    #[test]
    fn neural_failure_commits_spatial_base() {
        let log = Log::default();
        let mut pipeline = pipeline(
            Setup {
                spatial: Some(false),
                neural: Some(true),
            },
            &log,
        );

        let outcome = pipeline.process(&job(UpscaleMode::Hybrid, 1));
        assert_eq!(
            outcome,
            FrameOutcome::Enhanced {
                image: BASE,
                ran: UpscaleMode::SpatialOnly
            }
        );
        assert_eq!(
            log.lock().unwrap().last(),
            Some(&Call::Commit {
                enhanced: BASE,
                presented: ImageHandle(0x12)
            })
        );
        let stats = pipeline.stats().snapshot();
        assert_eq!((stats.enhanced, stats.neural_degraded), (1, 1));
    }

    #[test]
    fn spatial_failure_commits_nothing() {
        let log = Log::default();
        let mut pipeline = pipeline(
            Setup {
                spatial: Some(true),
                neural: Some(false),
            },
            &log,
        );

        let outcome = pipeline.process(&job(UpscaleMode::Hybrid, 1));
        assert_eq!(outcome, FrameOutcome::PassThrough(PassReason::SpatialFailed));
        let calls = log.lock().unwrap();
        assert!(!calls.iter().any(|c| matches!(c, Call::Neural { .. } | Call::Commit { .. })));
    }

    #[test]
    fn neural_only_falls_back_to_spatial() {
        let log = Log::default();
        let mut pipeline = pipeline(
            Setup {
                spatial: Some(false),
                neural: Some(true),
            },
            &log,
        );

        let outcome = pipeline.process(&job(UpscaleMode::NeuralOnly, 1));
        assert_eq!(
            outcome,
            FrameOutcome::Enhanced {
                image: BASE,
                ran: UpscaleMode::SpatialOnly
            }
        );
        assert!(matches!(
            log.lock().unwrap()[0],
            Call::Neural {
                width: 1920,
                height: 1080,
                ..
            }
        ));
    }

    #[test]
    fn neural_only_without_spatial_passes_through_on_failure() {
        let log = Log::default();
        let mut pipeline = pipeline(
            Setup {
                spatial: None,
                neural: Some(true),
            },
            &log,
        );
        let outcome = pipeline.process(&job(UpscaleMode::NeuralOnly, 1));
        assert_eq!(outcome, FrameOutcome::PassThrough(PassReason::NeuralFailed));
    }

    #[test]
    fn stale_sequence_is_rejected() {
        let log = Log::default();
        let mut pipeline = pipeline(
            Setup {
                spatial: Some(false),
                neural: None,
            },
            &log,
        );

        assert!(pipeline.process(&job(UpscaleMode::SpatialOnly, 2)).is_enhanced());
        assert_eq!(
            pipeline.process(&job(UpscaleMode::SpatialOnly, 2)),
            FrameOutcome::PassThrough(PassReason::OutOfOrder)
        );
        assert_eq!(
            pipeline.process(&job(UpscaleMode::SpatialOnly, 1)),
            FrameOutcome::PassThrough(PassReason::OutOfOrder)
        );
        assert!(pipeline.process(&job(UpscaleMode::SpatialOnly, 3)).is_enhanced());
    }

    #[test]
    fn nothing_available_passes_through() {
        let log = Log::default();
        let mut pipeline = pipeline(
            Setup {
                spatial: None,
                neural: None,
            },
            &log,
        );
        assert_eq!(
            pipeline.process(&job(UpscaleMode::Hybrid, 1)),
            FrameOutcome::PassThrough(PassReason::NoStageAvailable)
        );
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(pipeline.stats().snapshot().passthrough, 1);
    }

    #[test]
    fn bridge_failure_is_not_retried() {
        let attempts = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&attempts);
        let factory = move |_surface: SurfaceHandle| -> Result<Box<dyn FrameBridge>> {
            *counter.lock().unwrap() += 1;
            Err(anyhow!("out of device memory"))
        };
        let log = Log::default();
        let mut pipeline = HybridPipeline::new(
            PipelineSettings {
                scale_factor: 2,
                sharpness: 0.2,
            },
            Some(Box::new(MockSpatial { log, fail: false })),
            None,
            Box::new(factory),
            Arc::default(),
        );

        for seq in 1..=3 {
            assert_eq!(
                pipeline.process(&job(UpscaleMode::SpatialOnly, seq)),
                FrameOutcome::PassThrough(PassReason::BridgeUnavailable)
            );
        }
        assert_eq!(*attempts.lock().unwrap(), 1);
    }

    #[test]
    fn forgotten_surface_starts_over_at_one() {
        let log = Log::default();
        let mut pipeline = pipeline(
            Setup {
                spatial: Some(false),
                neural: None,
            },
            &log,
        );

        assert!(pipeline.process(&job(UpscaleMode::SpatialOnly, 5)).is_enhanced());
        pipeline.forget_surface(SurfaceHandle(0x51));
        assert!(pipeline.process(&job(UpscaleMode::SpatialOnly, 1)).is_enhanced());
        assert_eq!(pipeline.stats().snapshot().enhanced, 2);
    }

    #[test]
    fn pass_log_forgets_only_one_surface() {
        let mut passes = PassLog::default();
        passes.note(SurfaceHandle(1), PassReason::UnknownSurface);
        passes.note(SurfaceHandle(1), PassReason::CommitFailed);
        passes.note(SurfaceHandle(2), PassReason::UnknownSurface);

        passes.forget(SurfaceHandle(1));
        assert_eq!(
            passes.warned,
            HashSet::from([(SurfaceHandle(2), PassReason::UnknownSurface)])
        );

        passes.clear();
        assert!(passes.warned.is_empty());
    }

    #[test]
    fn effective_mode_narrows_to_available_stages() {
        let both = StageAvailability {
            spatial: true,
            neural: true,
        };
        let spatial = StageAvailability {
            spatial: true,
            neural: false,
        };
        let neural = StageAvailability {
            spatial: false,
            neural: true,
        };
        let none = StageAvailability {
            spatial: false,
            neural: false,
        };

        assert_eq!(effective_mode(UpscaleMode::Hybrid, both), Some(UpscaleMode::Hybrid));
        assert_eq!(effective_mode(UpscaleMode::Hybrid, spatial), Some(UpscaleMode::SpatialOnly));
        assert_eq!(effective_mode(UpscaleMode::Hybrid, neural), Some(UpscaleMode::NeuralOnly));
        assert_eq!(effective_mode(UpscaleMode::NeuralOnly, spatial), Some(UpscaleMode::SpatialOnly));
        assert_eq!(effective_mode(UpscaleMode::SpatialOnly, neural), None);
        assert_eq!(effective_mode(UpscaleMode::Hybrid, none), None);
    }
}

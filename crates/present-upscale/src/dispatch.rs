//! Per-present decision point.
//!
//! Every intercepted present is evaluated target by target: resolve the
//! surface in the registry, build a [`FrameJob`] with the next sequence number
//! for that surface, and either run the pipeline inline or queue the job for
//! the worker. The original present is forwarded exactly once afterwards,
//! whatever the outcome.
//!
//! Pipelined mode keeps at most one job in flight per surface. Each queued job
//! carries a completion signal; the next present on the same surface waits for
//! it before its own job is queued, so the worker never touches an image the
//! driver has already handed back to the application for the following frame.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use present_core::{
    CaptureError, CreatedSurface, DispatchMode, FrameJob, ImageHandle, PresentTarget, SurfaceHandle, UpscaleMode,
};
use tracing::{debug, error, info, trace};

use crate::handoff::FrameHandoff;
use crate::pipeline::{FrameOutcome, HybridPipeline, PassLog, PassReason, PipelineStats};
use crate::registry::SurfaceRegistry;

/// What happened to one (surface, index) pair of a present call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PresentDecision {
    /// Ran inline, or never reached the pipeline.
    Completed(FrameOutcome),
    /// Handed to the worker.
    Queued { sequence: u64 },
}

impl PresentDecision {
    fn pass(reason: PassReason) -> Self {
        PresentDecision::Completed(FrameOutcome::PassThrough(reason))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── Worker ─────────────────────────────────────────────────────────────────

struct QueuedJob {
    job: FrameJob,
    done: Sender<()>,
}

/// Completion signal of the job in flight on one surface.
type Gate = Arc<Mutex<Option<Receiver<()>>>>;

struct Worker {
    handoff: Arc<FrameHandoff<QueuedJob>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    /// Only held long enough to clone a surface's gate out of it.
    gates: Mutex<HashMap<SurfaceHandle, Gate>>,
}

impl Worker {
    fn spawn(pipeline: Arc<Mutex<HybridPipeline>>, capacity: usize) -> std::io::Result<Self> {
        let handoff = Arc::new(FrameHandoff::bounded(capacity));
        let queue = Arc::clone(&handoff);
        let thread = std::thread::Builder::new()
            .name("present-upscale-worker".into())
            .spawn(move || {
                debug!("Upscale worker started");
                while let Some(QueuedJob { job, done }) = queue.pop() {
                    if panic::catch_unwind(AssertUnwindSafe(|| lock(&pipeline).process(&job))).is_err() {
                        error!("{} seq {}: upscale job panicked; frame left unenhanced", job.surface, job.sequence);
                    }
                    let _ = done.send(());
                }
                debug!("Upscale worker drained");
            })?;
        Ok(Self {
            handoff,
            thread: Mutex::new(Some(thread)),
            gates: Mutex::new(HashMap::new()),
        })
    }

    fn gate(&self, surface: SurfaceHandle) -> Gate {
        Arc::clone(lock(&self.gates).entry(surface).or_default())
    }

    /// Block until the previous job behind `slot`, if any, has finished.
    fn wait_for_previous(slot: &mut Option<Receiver<()>>) {
        if let Some(fence) = slot.take() {
            // Err means the job was dropped unprocessed, which also ends it.
            let _ = fence.recv();
        }
    }

    fn stop(&self) {
        self.handoff.close();
        if let Some(thread) = lock(&self.thread).take() {
            if thread.join().is_err() {
                error!("Upscale worker panicked");
            }
        }
        lock(&self.gates).clear();
    }
}

enum Scheduler {
    Inline,
    Queued(Worker),
}

// ─── Dispatcher ─────────────────────────────────────────────────────────────

pub struct Dispatcher {
    registry: SurfaceRegistry,
    pipeline: Arc<Mutex<HybridPipeline>>,
    scheduler: Scheduler,
    mode: UpscaleMode,
    sequences: Mutex<HashMap<SurfaceHandle, u64>>,
    misses: Mutex<PassLog>,
    stats: Arc<PipelineStats>,
    stopped: AtomicBool,
}

impl Dispatcher {
    /// A pipelined dispatcher whose worker cannot be spawned runs inline.
    pub fn new(
        registry: SurfaceRegistry,
        pipeline: HybridPipeline,
        mode: UpscaleMode,
        dispatch: DispatchMode,
        queue_capacity: usize,
    ) -> Self {
        let stats = Arc::clone(pipeline.stats());
        let pipeline = Arc::new(Mutex::new(pipeline));
        let scheduler = match dispatch {
            DispatchMode::Synchronous => Scheduler::Inline,
            DispatchMode::Pipelined => match Worker::spawn(Arc::clone(&pipeline), queue_capacity) {
                Ok(worker) => {
                    info!("Pipelined dispatch with queue capacity {}", worker.handoff.capacity());
                    Scheduler::Queued(worker)
                }
                Err(e) => {
                    error!("Failed to spawn upscale worker, running inline: {e}");
                    Scheduler::Inline
                }
            },
        };
        Self {
            registry,
            pipeline,
            scheduler,
            mode,
            sequences: Mutex::new(HashMap::new()),
            misses: Mutex::new(PassLog::default()),
            stats,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        match self.scheduler {
            Scheduler::Inline => DispatchMode::Synchronous,
            Scheduler::Queued(_) => DispatchMode::Pipelined,
        }
    }

    // ── Bookkeeping calls ────────────────────────────────────────────

    pub fn on_surface_created(&self, created: CreatedSurface) {
        // A recreated handle starts over: drop the old bridge and sequence.
        if self.registry.lookup(created.surface).is_some() {
            self.release_surface(created.surface);
        }
        self.registry
            .record_created(created.surface, created.width, created.height);
    }

    pub fn on_images(&self, surface: SurfaceHandle, images: Vec<ImageHandle>) -> bool {
        self.registry.record_images(surface, images)
    }

    pub fn on_surface_destroyed(&self, surface: SurfaceHandle) {
        self.release_surface(surface);
        if self.registry.forget(surface) {
            debug!("Forgot destroyed {surface}");
        }
    }

    fn release_surface(&self, surface: SurfaceHandle) {
        let gate = match &self.scheduler {
            Scheduler::Queued(worker) => Some(worker.gate(surface)),
            Scheduler::Inline => None,
        };
        let mut slot = gate.as_deref().map(lock);
        if let Some(slot) = slot.as_deref_mut() {
            Worker::wait_for_previous(slot);
        }
        lock(&self.sequences).remove(&surface);
        lock(&self.misses).forget(surface);
        lock(&self.pipeline).forget_surface(surface);
        if let Scheduler::Queued(worker) = &self.scheduler {
            lock(&worker.gates).remove(&surface);
        }
    }

    // ── Present ──────────────────────────────────────────────────────

    /// Evaluate every target, then call `forward` exactly once and return
    /// its result untouched. A panicking collaborator is contained here.
    pub fn on_present<I, R>(&self, targets: I, forward: impl FnOnce() -> R) -> R
    where
        I: IntoIterator<Item = PresentTarget>,
    {
        if panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(targets))).is_err() {
            error!("Upscale evaluation panicked; presenting unenhanced");
        }
        forward()
    }

    /// Evaluate every target of one present call without forwarding it.
    pub fn evaluate<I>(&self, targets: I) -> Vec<PresentDecision>
    where
        I: IntoIterator<Item = PresentTarget>,
    {
        targets.into_iter().map(|target| self.decide(target)).collect()
    }

    fn decide(&self, target: PresentTarget) -> PresentDecision {
        if self.stopped.load(Ordering::Acquire) {
            return PresentDecision::pass(PassReason::Stopped);
        }
        let (image, width, height) = match self.resolve(target) {
            Ok(resolved) => resolved,
            Err(e) => {
                trace!("Present pass-through: {e}");
                let reason = match e {
                    CaptureError::ImageIndexOutOfRange { .. } => PassReason::IndexOutOfRange,
                    _ => PassReason::UnknownSurface,
                };
                return self.miss(target.surface, reason);
            }
        };
        let build = |sequence| FrameJob {
            surface: target.surface,
            image_index: target.image_index,
            image,
            width,
            height,
            mode: self.mode,
            sequence,
        };

        match &self.scheduler {
            Scheduler::Inline => {
                let mut pipeline = lock(&self.pipeline);
                let job = build(self.next_sequence(target.surface));
                PresentDecision::Completed(pipeline.process(&job))
            }
            Scheduler::Queued(worker) => {
                let gate = worker.gate(target.surface);
                let mut slot = lock(&gate);
                Worker::wait_for_previous(&mut slot);
                let job = build(self.next_sequence(target.surface));
                let sequence = job.sequence;
                let (done, fence) = crossbeam_channel::bounded(1);
                match worker.handoff.push(QueuedJob { job, done }) {
                    Ok(()) => {
                        *slot = Some(fence);
                        trace!(surface = %target.surface, seq = sequence, "Frame queued");
                        PresentDecision::Queued { sequence }
                    }
                    Err(e) => {
                        drop(slot);
                        let e: CaptureError = e.into();
                        debug!("{}: {e}", target.surface);
                        self.miss(target.surface, PassReason::QueueRejected)
                    }
                }
            }
        }
    }

    /// Resolve a target to its backing image and extent. Read-only.
    fn resolve(&self, target: PresentTarget) -> Result<(ImageHandle, u32, u32), CaptureError> {
        let record = self
            .registry
            .lookup(target.surface)
            .ok_or(CaptureError::UnknownSurface(target.surface))?;
        let image = record
            .image(target.image_index)
            .ok_or(CaptureError::ImageIndexOutOfRange {
                surface: target.surface,
                index: target.image_index,
                count: record.images.len(),
            })?;
        Ok((image, record.width, record.height))
    }

    fn next_sequence(&self, surface: SurfaceHandle) -> u64 {
        let mut sequences = lock(&self.sequences);
        let next = sequences.entry(surface).or_insert(0);
        *next += 1;
        *next
    }

    fn miss(&self, surface: SurfaceHandle, reason: PassReason) -> PresentDecision {
        let outcome = FrameOutcome::PassThrough(reason);
        self.stats.record(&outcome);
        lock(&self.misses).note(surface, reason);
        PresentDecision::Completed(outcome)
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// Stop accepting jobs, drain the worker and release every bridge.
    /// A second call does nothing.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Scheduler::Queued(worker) = &self.scheduler {
            worker.stop();
        }
        lock(&self.pipeline).shutdown();
        lock(&self.sequences).clear();
        lock(&self.misses).clear();
        self.registry.clear();
        debug!("Dispatcher stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

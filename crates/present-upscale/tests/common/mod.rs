#![allow(dead_code)]

use std::collections::HashSet;
use std::ffi::c_void;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use crossbeam_channel::Receiver;
use compute_interop::{
    BridgeFactory, FnAddr, FrameBridge, NeuralUpscaler, RedirectFacility, SpatialConstants, SpatialExtents,
    SpatialUpscaler,
};
use present_core::{ImageHandle, ModelPaths, SurfaceHandle, UpscaleConfig};
use present_upscale::Collaborators;

pub const BASE: ImageHandle = ImageHandle(0xba5e);
pub const REFINE: ImageHandle = ImageHandle(0xf1e0);

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LoadModel,
    Constants { output: (u32, u32), sharpness: f32 },
    Spatial { input: ImageHandle, output: ImageHandle },
    Neural { input: ImageHandle, output: ImageHandle, width: u32, height: u32 },
    Commit { enhanced: ImageHandle, presented: ImageHandle },
    BridgeCreated(SurfaceHandle),
    Frame { surface: SurfaceHandle, sequence: u64 },
    Cleanup,
    Install(usize),
    UninstallAll,
}

#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Call>>>);

impl Recorder {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Sequence numbers in the order the pipeline started them on `surface`.
    pub fn sequences(&self, surface: SurfaceHandle) -> Vec<u64> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match *c {
                Call::Frame { surface: s, sequence } if s == surface => Some(sequence),
                _ => None,
            })
            .collect()
    }

    /// Index of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|c| pred(c))
    }

    pub fn compute_calls(&self) -> usize {
        self.count(|c| {
            matches!(
                c,
                Call::Constants { .. } | Call::Spatial { .. } | Call::Neural { .. } | Call::Commit { .. }
            )
        })
    }
}

// ─── Compute mocks ──────────────────────────────────────────────────────────

#[derive(Default, Clone, Copy)]
pub enum Behavior {
    #[default]
    Succeed,
    Fail,
    Panic,
}

pub struct MockSpatial {
    pub rec: Recorder,
    pub behavior: Behavior,
    /// Each dispatch waits for one message, or for the sender to go away.
    pub gate: Option<Receiver<()>>,
}

impl SpatialUpscaler for MockSpatial {
    fn name(&self) -> &str {
        "mock-spatial"
    }

    fn compute_constants(&self, extents: &SpatialExtents, sharpness: f32) -> Result<SpatialConstants> {
        self.rec.push(Call::Constants {
            output: (extents.output_width, extents.output_height),
            sharpness,
        });
        Ok(SpatialConstants::default())
    }

    fn dispatch(&mut self, _constants: &SpatialConstants, input: ImageHandle, output: ImageHandle) -> Result<()> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        self.rec.push(Call::Spatial { input, output });
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => bail!("spatial kernel failed"),
            Behavior::Panic => panic!("spatial kernel crashed"),
        }
    }
}

pub struct MockNeural {
    pub rec: Recorder,
    pub behavior: Behavior,
    pub model_loads: bool,
}

impl NeuralUpscaler for MockNeural {
    fn name(&self) -> &str {
        "mock-neural"
    }

    fn load_model(&mut self, _paths: &ModelPaths) -> Result<()> {
        self.rec.push(Call::LoadModel);
        if !self.model_loads {
            bail!("model file missing");
        }
        Ok(())
    }

    fn infer(&mut self, input: ImageHandle, output: ImageHandle, width: u32, height: u32) -> Result<()> {
        self.rec.push(Call::Neural {
            input,
            output,
            width,
            height,
        });
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => bail!("inference failed"),
            Behavior::Panic => panic!("inference crashed"),
        }
    }
}

pub struct MockBridge {
    rec: Recorder,
    surface: SurfaceHandle,
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
        self.rec.push(Call::Commit { enhanced, presented });
        true
    }

    fn cleanup(&mut self) {
        self.rec.push(Call::Cleanup);
    }

    fn dimensions(&self) -> (u32, u32) {
        self.size
    }

    fn begin_frame(&mut self, sequence: u64) {
        self.rec.push(Call::Frame {
            surface: self.surface,
            sequence,
        });
    }
}

pub struct MockBridges(pub Recorder);

impl BridgeFactory for MockBridges {
    fn create(&self, surface: SurfaceHandle) -> Result<Box<dyn FrameBridge>> {
        self.0.push(Call::BridgeCreated(surface));
        Ok(Box::new(MockBridge {
            rec: self.0.clone(),
            surface,
            size: (0, 0),
        }))
    }
}

// ─── Redirect facility mock ─────────────────────────────────────────────────

/// Installs nothing; reports the target itself as the original so a detour
/// forwards straight into the fake entry point.
pub struct FakeFacility {
    pub rec: Recorder,
    pub fail_init: bool,
    /// Target addresses whose install fails.
    pub refuse: HashSet<usize>,
}

impl RedirectFacility for FakeFacility {
    fn initialize(&mut self) -> Result<()> {
        if self.fail_init {
            bail!("hook engine refused to start");
        }
        Ok(())
    }

    unsafe fn install(&mut self, target: FnAddr, _detour: FnAddr) -> Result<FnAddr> {
        let addr = target.as_ptr() as usize;
        if self.refuse.contains(&addr) {
            bail!("target not patchable");
        }
        self.rec.push(Call::Install(addr));
        Ok(target)
    }

    fn uninstall_all(&mut self) {
        self.rec.push(Call::UninstallAll);
    }
}

pub fn addr(ptr: *const c_void) -> FnAddr {
    FnAddr::new(ptr).unwrap()
}

// ─── Assembly ───────────────────────────────────────────────────────────────

pub struct Setup {
    pub spatial: Option<Behavior>,
    pub spatial_gate: Option<Receiver<()>>,
    pub neural: Option<Behavior>,
    pub model_loads: bool,
    pub fail_init: bool,
    pub refuse: HashSet<usize>,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            spatial: Some(Behavior::Succeed),
            spatial_gate: None,
            neural: Some(Behavior::Succeed),
            model_loads: true,
            fail_init: false,
            refuse: HashSet::new(),
        }
    }
}

pub fn collaborators(setup: Setup, rec: &Recorder) -> Collaborators {
    Collaborators {
        facility: Box::new(FakeFacility {
            rec: rec.clone(),
            fail_init: setup.fail_init,
            refuse: setup.refuse,
        }),
        spatial: setup.spatial.map(|behavior| {
            Box::new(MockSpatial {
                rec: rec.clone(),
                behavior,
                gate: setup.spatial_gate,
            }) as Box<dyn SpatialUpscaler>
        }),
        neural: setup.neural.map(|behavior| {
            Box::new(MockNeural {
                rec: rec.clone(),
                behavior,
                model_loads: setup.model_loads,
            }) as Box<dyn NeuralUpscaler>
        }),
        bridges: Box::new(MockBridges(rec.clone())),
    }
}

pub fn config() -> UpscaleConfig {
    UpscaleConfig::default()
}

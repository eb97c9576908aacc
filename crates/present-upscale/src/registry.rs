//! Presentable-surface bookkeeping keyed by the driver's handle.
//!
//! Populated from the creation and enumeration detours, read on every
//! present. One lock per registry; every critical section is a single map
//! operation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use present_core::{ImageHandle, SurfaceHandle};
use tracing::{debug, warn};

/// Extent and backing images of one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRecord {
    pub width: u32,
    pub height: u32,
    /// Backing images in the order the driver cycles through them.
    pub images: Vec<ImageHandle>,
}

impl SurfaceRecord {
    pub fn image(&self, index: u32) -> Option<ImageHandle> {
        self.images.get(index as usize).copied()
    }
}

#[derive(Default)]
struct Inner {
    records: HashMap<SurfaceHandle, SurfaceRecord>,
    /// Creation order, oldest first, for eviction.
    order: VecDeque<SurfaceHandle>,
}

pub struct SurfaceRegistry {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl SurfaceRegistry {
    /// `capacity` caps concurrently tracked surfaces; the oldest-created
    /// record is evicted when a new surface would exceed it.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a created surface. A repeated handle replaces the old record,
    /// dropping its image list.
    pub fn record_created(&self, surface: SurfaceHandle, width: u32, height: u32) {
        let mut inner = self.lock();
        let record = SurfaceRecord {
            width,
            height,
            images: Vec::new(),
        };
        if inner.records.insert(surface, record).is_some() {
            inner.order.retain(|s| *s != surface);
        }
        inner.order.push_back(surface);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.records.remove(&oldest);
                debug!("Evicted {oldest} from surface registry");
            }
        }
        debug!("Registered {surface} at {width}x{height}");
    }

    /// Attach the backing image list. Returns `false` (and changes nothing)
    /// for a surface that was never recorded.
    pub fn record_images(&self, surface: SurfaceHandle, images: Vec<ImageHandle>) -> bool {
        let mut inner = self.lock();
        match inner.records.get_mut(&surface) {
            Some(record) => {
                debug!("Registered {} images for {surface}", images.len());
                record.images = images;
                true
            }
            None => {
                warn!("Image list for unregistered {surface} ignored");
                false
            }
        }
    }

    pub fn lookup(&self, surface: SurfaceHandle) -> Option<SurfaceRecord> {
        self.lock().records.get(&surface).cloned()
    }

    /// Remove a destroyed surface. Unknown handles are ignored.
    pub fn forget(&self, surface: SurfaceHandle) -> bool {
        let mut inner = self.lock();
        let removed = inner.records.remove(&surface).is_some();
        if removed {
            inner.order.retain(|s| *s != surface);
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.records.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

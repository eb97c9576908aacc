//! Installed-redirect bookkeeping on top of a [`RedirectFacility`].
//!
//! Installation is single-writer: once at attach, removal once at detach.
//! Originals are published into [`Originals`] so detours can read them
//! without taking a lock.

use std::collections::HashMap;

use compute_interop::{EntryKind, FnAddr, RedirectFacility};
use once_cell::sync::OnceCell;
use present_core::CaptureError;
use tracing::{debug, info};

/// Lock-free slots for the original entry points.
#[derive(Default)]
pub struct Originals {
    slots: [OnceCell<FnAddr>; 4],
}

impl Originals {
    fn index(kind: EntryKind) -> usize {
        match kind {
            EntryKind::CreateSurface => 0,
            EntryKind::EnumerateImages => 1,
            EntryKind::DestroySurface => 2,
            EntryKind::Present => 3,
        }
    }

    /// First write wins; later writes for the same kind are ignored.
    pub fn publish(&self, kind: EntryKind, original: FnAddr) {
        let _ = self.slots[Self::index(kind)].set(original);
    }

    pub fn get(&self, kind: EntryKind) -> Option<FnAddr> {
        self.slots[Self::index(kind)].get().copied()
    }
}

#[derive(Debug, Copy, Clone)]
struct InstalledHook {
    target: FnAddr,
    original: FnAddr,
}

pub struct HookTable {
    facility: Box<dyn RedirectFacility>,
    installed: HashMap<EntryKind, InstalledHook>,
}

impl HookTable {
    /// Initialize the facility. Failure here is the one fatal condition:
    /// capture stays disabled for the process lifetime.
    pub fn new(mut facility: Box<dyn RedirectFacility>) -> Result<Self, CaptureError> {
        facility
            .initialize()
            .map_err(|e| CaptureError::FacilityInit(format!("{e:#}")))?;
        Ok(Self {
            facility,
            installed: HashMap::new(),
        })
    }

    /// Redirect `kind` at `target` to `detour`, returning the original.
    ///
    /// Installing an entry point that is already redirected is a no-op that
    /// returns the existing original.
    ///
    /// # Safety
    ///
    /// See [`RedirectFacility::install`].
    pub unsafe fn install(
        &mut self,
        kind: EntryKind,
        target: FnAddr,
        detour: FnAddr,
    ) -> Result<FnAddr, CaptureError> {
        if let Some(hook) = self.installed.get(&kind) {
            debug!("{} already redirected at {:?}", kind.name(), hook.target.as_ptr());
            return Ok(hook.original);
        }
        let original = unsafe { self.facility.install(target, detour) }.map_err(|e| {
            CaptureError::HookInstall {
                entry: kind.name(),
                reason: format!("{e:#}"),
            }
        })?;
        self.installed.insert(kind, InstalledHook { target, original });
        info!("Redirected {}", kind.name());
        Ok(original)
    }

    pub fn is_installed(&self, kind: EntryKind) -> bool {
        self.installed.contains_key(&kind)
    }

    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }

    /// Remove every redirect. A second call finds nothing to do.
    pub fn uninstall_all(&mut self) {
        if self.installed.is_empty() {
            return;
        }
        self.facility.uninstall_all();
        info!("Removed {} redirects", self.installed.len());
        self.installed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_void;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        installs: usize,
        uninstalls: usize,
    }

    struct FakeFacility {
        calls: Arc<Mutex<Calls>>,
        fail_init: bool,
    }

    impl RedirectFacility for FakeFacility {
        fn initialize(&mut self) -> anyhow::Result<()> {
            if self.fail_init {
                anyhow::bail!("trampoline allocator unavailable");
            }
            Ok(())
        }

        unsafe fn install(&mut self, target: FnAddr, _detour: FnAddr) -> anyhow::Result<FnAddr> {
            self.calls.lock().unwrap().installs += 1;
            Ok(FnAddr::new((target.as_ptr() as usize + 1) as *const c_void).unwrap())
        }

        fn uninstall_all(&mut self) {
            self.calls.lock().unwrap().uninstalls += 1;
        }
    }

    fn addr(value: usize) -> FnAddr {
        FnAddr::new(value as *const c_void).unwrap()
    }

    #[test]
    fn reinstall_is_a_noop() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut table = HookTable::new(Box::new(FakeFacility {
            calls: Arc::clone(&calls),
            fail_init: false,
        }))
        .unwrap();

        let first = unsafe { table.install(EntryKind::Present, addr(0x1000), addr(0x2000)) }.unwrap();
        let second = unsafe { table.install(EntryKind::Present, addr(0x1000), addr(0x2000)) }.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.lock().unwrap().installs, 1);
        assert!(table.is_installed(EntryKind::Present));
    }

    #[test]
    fn uninstall_all_twice_is_safe() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut table = HookTable::new(Box::new(FakeFacility {
            calls: Arc::clone(&calls),
            fail_init: false,
        }))
        .unwrap();
        unsafe { table.install(EntryKind::CreateSurface, addr(0x10), addr(0x20)) }.unwrap();

        table.uninstall_all();
        table.uninstall_all();
        assert_eq!(calls.lock().unwrap().uninstalls, 1);
        assert_eq!(table.installed_count(), 0);
    }

    #[test]
    fn facility_init_failure_is_fatal() {
        let err = HookTable::new(Box::new(FakeFacility {
            calls: Arc::default(),
            fail_init: true,
        }))
        .err()
        .unwrap();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("trampoline allocator unavailable"));
    }

    #[test]
    fn originals_first_publish_wins() {
        let originals = Originals::default();
        assert!(originals.get(EntryKind::Present).is_none());
        originals.publish(EntryKind::Present, addr(0x40));
        originals.publish(EntryKind::Present, addr(0x80));
        assert_eq!(originals.get(EntryKind::Present), Some(addr(0x40)));
    }
}

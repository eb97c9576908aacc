//! Runtime discovery of the graphics loader and its WSI entry points.
//!
//! Probing replaces build-time backend selection: if the loader or a symbol
//! is missing, that entry point is simply not intercepted.

use std::collections::HashMap;
use std::ffi::c_void;

use anyhow::{anyhow, Result};
use libloading::{Library, Symbol};
use tracing::{debug, warn};

use crate::redirect::{EntryKind, FnAddr};

#[cfg(target_os = "windows")]
pub const LOADER_CANDIDATES: &[&str] = &["vulkan-1.dll"];
#[cfg(target_os = "macos")]
pub const LOADER_CANDIDATES: &[&str] = &["libvulkan.1.dylib", "libMoltenVK.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const LOADER_CANDIDATES: &[&str] = &["libvulkan.so.1", "libvulkan.so"];

/// An opened graphics loader library.
///
/// Keeps the library mapped for as long as redirects into it may be live.
pub struct DriverLoader {
    library: Library,
    name: String,
}

impl DriverLoader {
    /// Open the first available platform loader.
    pub fn open() -> Result<Self> {
        Self::open_from(LOADER_CANDIDATES)
    }

    pub fn open_from(candidates: &[&str]) -> Result<Self> {
        for &name in candidates {
            // SAFETY: loading a system graphics loader runs its initializers,
            // which the host process already expects to happen.
            match unsafe { Library::new(name) } {
                Ok(library) => {
                    debug!("Opened graphics loader {name}");
                    return Ok(Self {
                        library,
                        name: name.to_string(),
                    });
                }
                Err(e) => debug!("Graphics loader {name} unavailable: {e}"),
            }
        }
        Err(anyhow!("no graphics loader found (tried {candidates:?})"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve one exported function by null-terminated name.
    pub fn resolve(&self, symbol: &[u8]) -> Option<FnAddr> {
        // SAFETY: the symbol is only read as an address, never called here.
        let sym: Symbol<*mut c_void> = unsafe { self.library.get(symbol) }.ok()?;
        FnAddr::new(*sym)
    }

    /// Resolve every [`EntryKind`]; missing ones are logged and left out.
    pub fn entry_points(&self) -> HashMap<EntryKind, FnAddr> {
        let mut found = HashMap::new();
        for kind in EntryKind::ALL {
            match self.resolve(kind.symbol()) {
                Some(addr) => {
                    found.insert(kind, addr);
                }
                None => warn!("{}: {} not exported", self.name, kind.name()),
            }
        }
        found
    }
}

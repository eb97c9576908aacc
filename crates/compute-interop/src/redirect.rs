//! Interception facility contract.
//!
//! The trampoline mechanics live behind [`RedirectFacility`]; the capture
//! layer only needs "install a redirect, get the original back" and
//! "remove everything".

use std::ffi::c_void;
use std::ptr::NonNull;

use anyhow::Result;
use present_core::ffi;

/// Address of a function entry point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FnAddr(NonNull<c_void>);

// SAFETY: a code address carries no thread affinity.
unsafe impl Send for FnAddr {}
unsafe impl Sync for FnAddr {}

impl FnAddr {
    pub fn new(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(Self)
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr()
    }
}

/// The driver entry points the capture layer redirects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    CreateSurface,
    EnumerateImages,
    DestroySurface,
    Present,
}

impl EntryKind {
    /// Install order: bookkeeping hooks first so no present can observe a
    /// surface whose creation went unrecorded.
    pub const ALL: [EntryKind; 4] = [
        EntryKind::CreateSurface,
        EntryKind::EnumerateImages,
        EntryKind::DestroySurface,
        EntryKind::Present,
    ];

    /// Null-terminated export name.
    pub fn symbol(self) -> &'static [u8] {
        match self {
            EntryKind::CreateSurface => ffi::SYM_CREATE_SWAPCHAIN,
            EntryKind::EnumerateImages => ffi::SYM_GET_SWAPCHAIN_IMAGES,
            EntryKind::DestroySurface => ffi::SYM_DESTROY_SWAPCHAIN,
            EntryKind::Present => ffi::SYM_QUEUE_PRESENT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntryKind::CreateSurface => "vkCreateSwapchainKHR",
            EntryKind::EnumerateImages => "vkGetSwapchainImagesKHR",
            EntryKind::DestroySurface => "vkDestroySwapchainKHR",
            EntryKind::Present => "vkQueuePresentKHR",
        }
    }
}

/// Runtime function redirection.
pub trait RedirectFacility: Send {
    /// Bring up the underlying mechanism. Failure disables capture for the
    /// process lifetime.
    fn initialize(&mut self) -> Result<()>;

    /// Redirect `target` to `detour` and return a callable address of the
    /// original.
    ///
    /// # Safety
    ///
    /// `target` must be the entry of a live function whose ABI matches
    /// `detour`.
    unsafe fn install(&mut self, target: FnAddr, detour: FnAddr) -> Result<FnAddr>;

    /// Disable and remove every redirect installed so far.
    fn uninstall_all(&mut self);
}

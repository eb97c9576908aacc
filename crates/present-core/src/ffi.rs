//! Hand-written C-repr layouts for the intercepted presentation calls.
//!
//! Only the swapchain-facing subset of the Vulkan WSI ABI is described here:
//! creation, image enumeration, destruction and present. Layouts follow
//! `vulkan_core.h` so the detours can read the arguments the host passes.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

use std::ffi::c_void;

// =====================================================================
// Handles
// =====================================================================

/// Dispatchable handles are pointers.
pub type VkDevice = *mut c_void;
pub type VkQueue = *mut c_void;

/// Non-dispatchable handles are 64-bit integers on every platform.
pub type VkSwapchainKHR = u64;
pub type VkSurfaceKHR = u64;
pub type VkImage = u64;
pub type VkSemaphore = u64;

pub const VK_NULL_HANDLE: u64 = 0;

// =====================================================================
// Result codes
// =====================================================================

pub type VkResult = i32;

pub const VK_SUCCESS: VkResult = 0;
pub const VK_INCOMPLETE: VkResult = 5;
pub const VK_SUBOPTIMAL_KHR: VkResult = 1_000_001_003;
pub const VK_ERROR_INITIALIZATION_FAILED: VkResult = -3;
pub const VK_ERROR_OUT_OF_DATE_KHR: VkResult = -1_000_001_004;

// =====================================================================
// Structure types
// =====================================================================

pub const VK_STRUCTURE_TYPE_SWAPCHAIN_CREATE_INFO_KHR: i32 = 1_000_001_000;
pub const VK_STRUCTURE_TYPE_PRESENT_INFO_KHR: i32 = 1_000_001_001;

// =====================================================================
// C-repr structs
// =====================================================================

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct VkExtent2D {
    pub width: u32,
    pub height: u32,
}

/// Opaque allocator callbacks; never dereferenced, only forwarded.
#[repr(C)]
pub struct VkAllocationCallbacks {
    _private: [u8; 0],
}

/// `VkSwapchainCreateInfoKHR`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct VkSwapchainCreateInfoKHR {
    pub sType: i32,
    pub pNext: *const c_void,
    pub flags: u32,
    pub surface: VkSurfaceKHR,
    pub minImageCount: u32,
    pub imageFormat: i32,
    pub imageColorSpace: i32,
    pub imageExtent: VkExtent2D,
    pub imageArrayLayers: u32,
    pub imageUsage: u32,
    pub imageSharingMode: i32,
    pub queueFamilyIndexCount: u32,
    pub pQueueFamilyIndices: *const u32,
    pub preTransform: u32,
    pub compositeAlpha: u32,
    pub presentMode: i32,
    pub clipped: u32,
    pub oldSwapchain: VkSwapchainKHR,
}

/// `VkPresentInfoKHR`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct VkPresentInfoKHR {
    pub sType: i32,
    pub pNext: *const c_void,
    pub waitSemaphoreCount: u32,
    pub pWaitSemaphores: *const VkSemaphore,
    pub swapchainCount: u32,
    pub pSwapchains: *const VkSwapchainKHR,
    pub pImageIndices: *const u32,
    pub pResults: *mut VkResult,
}

// =====================================================================
// Entry-point signatures
// =====================================================================

pub type PFN_vkCreateSwapchainKHR = unsafe extern "system" fn(
    device: VkDevice,
    pCreateInfo: *const VkSwapchainCreateInfoKHR,
    pAllocator: *const VkAllocationCallbacks,
    pSwapchain: *mut VkSwapchainKHR,
) -> VkResult;

pub type PFN_vkGetSwapchainImagesKHR = unsafe extern "system" fn(
    device: VkDevice,
    swapchain: VkSwapchainKHR,
    pSwapchainImageCount: *mut u32,
    pSwapchainImages: *mut VkImage,
) -> VkResult;

pub type PFN_vkDestroySwapchainKHR = unsafe extern "system" fn(
    device: VkDevice,
    swapchain: VkSwapchainKHR,
    pAllocator: *const VkAllocationCallbacks,
);

pub type PFN_vkQueuePresentKHR =
    unsafe extern "system" fn(queue: VkQueue, pPresentInfo: *const VkPresentInfoKHR) -> VkResult;

/// Exported symbol names, null-terminated for `dlsym`/`GetProcAddress`.
pub const SYM_CREATE_SWAPCHAIN: &[u8] = b"vkCreateSwapchainKHR\0";
pub const SYM_GET_SWAPCHAIN_IMAGES: &[u8] = b"vkGetSwapchainImagesKHR\0";
pub const SYM_DESTROY_SWAPCHAIN: &[u8] = b"vkDestroySwapchainKHR\0";
pub const SYM_QUEUE_PRESENT: &[u8] = b"vkQueuePresentKHR\0";

//! Replacement entry points handed to the redirect facility.
//!
//! Each detour calls the original exactly once and returns its result
//! unchanged. Bookkeeping happens after a successful original call, except
//! for destruction, which must release state while the handle is still valid.

use std::ffi::c_void;
use std::mem;

use compute_interop::{EntryKind, FnAddr};
use present_core::ffi::*;
use present_core::inputs::enumerated_images;
use present_core::{CreatedSurface, PresentRequest, SurfaceHandle};

use crate::context::CaptureContext;
use crate::lifecycle;

/// Detour address for `kind`.
pub fn detour_for(kind: EntryKind) -> Option<FnAddr> {
    let ptr = match kind {
        EntryKind::CreateSurface => create_swapchain as PFN_vkCreateSwapchainKHR as *const c_void,
        EntryKind::EnumerateImages => get_swapchain_images as PFN_vkGetSwapchainImagesKHR as *const c_void,
        EntryKind::DestroySurface => destroy_swapchain as PFN_vkDestroySwapchainKHR as *const c_void,
        EntryKind::Present => queue_present as PFN_vkQueuePresentKHR as *const c_void,
    };
    FnAddr::new(ptr)
}

fn original(kind: EntryKind) -> Option<(std::sync::Arc<CaptureContext>, FnAddr)> {
    let context = lifecycle::active()?;
    let original = context.original(kind)?;
    Some((context, original))
}

unsafe extern "system" fn create_swapchain(
    device: VkDevice,
    create_info: *const VkSwapchainCreateInfoKHR,
    allocator: *const VkAllocationCallbacks,
    swapchain: *mut VkSwapchainKHR,
) -> VkResult {
    let Some((context, addr)) = original(EntryKind::CreateSurface) else {
        return VK_ERROR_INITIALIZATION_FAILED;
    };
    // SAFETY: published by the facility for this entry point.
    let forward: PFN_vkCreateSwapchainKHR = unsafe { mem::transmute(addr.as_ptr()) };
    let result = unsafe { forward(device, create_info, allocator, swapchain) };
    if result == VK_SUCCESS {
        if let Some(created) = unsafe { CreatedSurface::from_raw(create_info, swapchain) } {
            context.dispatcher().on_surface_created(created);
        }
    }
    result
}

unsafe extern "system" fn get_swapchain_images(
    device: VkDevice,
    swapchain: VkSwapchainKHR,
    count: *mut u32,
    images: *mut VkImage,
) -> VkResult {
    let Some((context, addr)) = original(EntryKind::EnumerateImages) else {
        return VK_ERROR_INITIALIZATION_FAILED;
    };
    // SAFETY: published by the facility for this entry point.
    let forward: PFN_vkGetSwapchainImagesKHR = unsafe { mem::transmute(addr.as_ptr()) };
    let result = unsafe { forward(device, swapchain, count, images) };
    // VK_INCOMPLETE leaves a truncated list; only a complete fill counts.
    if result == VK_SUCCESS {
        if let Some(list) = unsafe { enumerated_images(count, images) } {
            context.dispatcher().on_images(SurfaceHandle(swapchain), list);
        }
    }
    result
}

unsafe extern "system" fn destroy_swapchain(
    device: VkDevice,
    swapchain: VkSwapchainKHR,
    allocator: *const VkAllocationCallbacks,
) {
    let Some((context, addr)) = original(EntryKind::DestroySurface) else {
        return;
    };
    if swapchain != VK_NULL_HANDLE {
        context.dispatcher().on_surface_destroyed(SurfaceHandle(swapchain));
    }
    // SAFETY: published by the facility for this entry point.
    let forward: PFN_vkDestroySwapchainKHR = unsafe { mem::transmute(addr.as_ptr()) };
    unsafe { forward(device, swapchain, allocator) }
}

unsafe extern "system" fn queue_present(queue: VkQueue, present_info: *const VkPresentInfoKHR) -> VkResult {
    let Some((context, addr)) = original(EntryKind::Present) else {
        return VK_ERROR_INITIALIZATION_FAILED;
    };
    // SAFETY: published by the facility for this entry point.
    let forward: PFN_vkQueuePresentKHR = unsafe { mem::transmute(addr.as_ptr()) };
    let request = unsafe { PresentRequest::from_raw(present_info) };
    context
        .dispatcher()
        .on_present(request.targets(), || unsafe { forward(queue, present_info) })
}

//! Safe views over the arguments the host passes to intercepted calls.

use crate::ffi::*;
use crate::types::{ImageHandle, SurfaceHandle};

/// One (surface, image index) pair named by a present call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PresentTarget {
    pub surface: SurfaceHandle,
    pub image_index: u32,
}

/// Surfaces and image indices referenced by a single present call.
#[derive(Debug)]
pub struct PresentRequest<'a> {
    pub swapchains: &'a [VkSwapchainKHR],
    pub image_indices: &'a [u32],
}

impl<'a> From<&'a VkPresentInfoKHR> for PresentRequest<'a> {
    fn from(val: &'a VkPresentInfoKHR) -> PresentRequest<'a> {
        let count = val.swapchainCount as usize;
        if count == 0 || val.pSwapchains.is_null() || val.pImageIndices.is_null() {
            return PresentRequest::empty();
        }
        // The present-info contract gives both arrays `swapchainCount` entries.
        unsafe {
            PresentRequest {
                swapchains: std::slice::from_raw_parts(val.pSwapchains, count),
                image_indices: std::slice::from_raw_parts(val.pImageIndices, count),
            }
        }
    }
}

impl<'a> PresentRequest<'a> {
    pub fn empty() -> Self {
        Self {
            swapchains: &[],
            image_indices: &[],
        }
    }

    /// Build from a raw pointer, treating null as an empty request.
    ///
    /// # Safety
    ///
    /// `info`, if non-null, must point to a valid `VkPresentInfoKHR` whose
    /// arrays outlive `'a`.
    pub unsafe fn from_raw(info: *const VkPresentInfoKHR) -> Self {
        match unsafe { info.as_ref() } {
            Some(info) => info.into(),
            None => Self::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.swapchains.len().min(self.image_indices.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn targets(&self) -> impl Iterator<Item = PresentTarget> + '_ {
        self.swapchains
            .iter()
            .zip(self.image_indices)
            .map(|(&swapchain, &image_index)| PresentTarget {
                surface: SurfaceHandle(swapchain),
                image_index,
            })
    }
}

/// A successfully created surface and the extent it was created with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CreatedSurface {
    pub surface: SurfaceHandle,
    pub width: u32,
    pub height: u32,
}

impl CreatedSurface {
    /// Read the created handle and extent after the original call returned.
    ///
    /// Returns `None` when either pointer is null or the handle is null.
    ///
    /// # Safety
    ///
    /// Non-null pointers must be valid for reads.
    pub unsafe fn from_raw(
        create_info: *const VkSwapchainCreateInfoKHR,
        swapchain: *const VkSwapchainKHR,
    ) -> Option<Self> {
        let info = unsafe { create_info.as_ref()? };
        let handle = unsafe { *swapchain.as_ref()? };
        if handle == VK_NULL_HANDLE {
            return None;
        }
        Some(Self {
            surface: SurfaceHandle(handle),
            width: info.imageExtent.width,
            height: info.imageExtent.height,
        })
    }
}

/// Copy the images written by a filled enumeration call.
///
/// The count-only call passes a null image array and yields `None`.
///
/// # Safety
///
/// `count` must be valid for reads and, when `images` is non-null, `images`
/// must hold at least `*count` entries.
pub unsafe fn enumerated_images(count: *const u32, images: *const VkImage) -> Option<Vec<ImageHandle>> {
    if images.is_null() {
        return None;
    }
    let count = unsafe { *count.as_ref()? } as usize;
    let images = unsafe { std::slice::from_raw_parts(images, count) };
    Some(images.iter().map(|&image| ImageHandle(image)).collect())
}

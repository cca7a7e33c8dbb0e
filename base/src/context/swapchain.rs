
use ash::vk;
use failure_derive::Fail;

use crate::context::instance::VkInstance;
use crate::context::device::{VkDevice, VkQueue};
use crate::context::surface::VkSurface;
use crate::utils::time::VkTimeDuration;
use crate::error::{VkResult, VkError};
use crate::vkuint;

use std::ptr;

#[derive(Debug, Clone)]
pub struct SwapchainConfig {

    /// wait for vertical blank before presenting.
    pub present_vsync: bool,
    /// used only when the surface lets the swapchain decide its size.
    pub dimension_preference: vk::Extent2D,
    /// how long `acquire_next_image` may block.
    pub image_acquire_time: VkTimeDuration,
}

impl Default for SwapchainConfig {

    fn default() -> SwapchainConfig {
        SwapchainConfig {
            present_vsync: true,
            dimension_preference: vk::Extent2D { width: 1280, height: 720 },
            image_acquire_time: VkTimeDuration::Infinite,
        }
    }
}

pub struct VkSwapchain {

    /// handle of `vk::SwapchainKHR`.
    handle: vk::SwapchainKHR,
    /// the extension loader provides functions for creation and destruction of `vk::SwapchainKHR` object.
    loader: ash::extensions::khr::Swapchain,
    /// Image resources of current swapchain.
    images: Vec<SwapchainImage>,
    /// the format of presentable images.
    pub format: vk::Format,
    /// the dimension of presentable images.
    pub dimension: vk::Extent2D,
    /// the queue used to present image.
    present_queue: VkQueue,

    config: SwapchainConfig,
}

/// A presentable image owned by the swapchain and the view created for it.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainImage {

    /// destroyed automatically together with `vk::SwapchainKHR`.
    pub image: vk::Image,
    pub view : vk::ImageView,
}

/// The image returned by a successful acquire.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AcquiredImage {

    pub index: vkuint,
    /// the image is usable but the swapchain no longer matches the surface exactly.
    pub is_suboptimal: bool,
}

/// Failures of acquire and present operations.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Fail)]
pub enum SwapchainSyncError {
    #[fail(display = "No image became available within the time allowed.")]
    TimeOut,
    #[fail(display = "Surface has changed and is not compatible with the swapchain.")]
    SurfaceOutDate,
    #[fail(display = "Swapchain operation failed with {}.", _0)]
    Unknown(vk::Result),
}

impl SwapchainSyncError {

    /// The raw status code of this error.
    pub fn result(&self) -> vk::Result {
        match self {
            | SwapchainSyncError::TimeOut        => vk::Result::TIMEOUT,
            | SwapchainSyncError::SurfaceOutDate => vk::Result::ERROR_OUT_OF_DATE_KHR,
            | SwapchainSyncError::Unknown(result) => *result,
        }
    }

    /// Convert to a fatal error naming the failed operation.
    pub fn into_error(self, ops: &'static str) -> VkError {
        VkError::api(ops, self.result())
    }
}

impl From<vk::Result> for SwapchainSyncError {

    fn from(result: vk::Result) -> SwapchainSyncError {
        match result {
            | vk::Result::TIMEOUT
            | vk::Result::NOT_READY             => SwapchainSyncError::TimeOut,
            | vk::Result::ERROR_OUT_OF_DATE_KHR => SwapchainSyncError::SurfaceOutDate,
            | _ => SwapchainSyncError::Unknown(result),
        }
    }
}

impl VkSwapchain {

    pub fn new(instance: &VkInstance, device: &VkDevice, surface: &VkSurface, config: SwapchainConfig, dimension: vk::Extent2D, old_chain: Option<&VkSwapchain>) -> VkResult<VkSwapchain> {

        let present_queue = query_present_queue(device, surface)?;

        let support_formats = surface.query_formats(device.phy.handle)?;
        let swapchain_format = choose_surface_format(&support_formats)
            .ok_or(VkError::unsupported("Surface Format"))?;

        let available_modes = surface.query_present_modes(device.phy.handle)?;
        let present_mode = choose_present_mode(&available_modes, config.present_vsync);

        let surface_caps = surface.query_capabilities(device.phy.handle)?;
        let preference = if dimension.width > 0 && dimension.height > 0 { dimension } else { config.dimension_preference };
        let swapchain_extent = choose_extent(&surface_caps, preference);
        let image_count = choose_image_count(&surface_caps);

        let swapchain_ci = vk::SwapchainCreateInfoKHR {
            s_type                   : vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            p_next                   : ptr::null(),
            flags                    : vk::SwapchainCreateFlagsKHR::empty(),
            surface                  : surface.handle,
            min_image_count          : image_count,
            image_format             : swapchain_format.format,
            image_color_space        : swapchain_format.color_space,
            image_extent             : swapchain_extent,
            image_array_layers       : 1,
            image_usage              : choose_image_usage(&surface_caps),
            image_sharing_mode       : vk::SharingMode::EXCLUSIVE,
            queue_family_index_count : 0,
            p_queue_family_indices   : ptr::null(),
            pre_transform            : choose_transform(&surface_caps),
            composite_alpha          : choose_composite_alpha(&surface_caps),
            present_mode,
            // allow the implementation to discard rendering outside of the surface area.
            clipped                  : vk::TRUE,
            old_swapchain            : old_chain.map(|chain| chain.handle).unwrap_or(vk::SwapchainKHR::null()),
        };

        let loader = ash::extensions::khr::Swapchain::new(&instance.handle, &device.logic.handle);

        let handle = unsafe {
            loader.create_swapchain(&swapchain_ci, None)
                .map_err(|e| VkError::api("Swapchain Creation", e))?
        };

        let images = obtain_swapchain_images(device, handle, &loader, swapchain_format.format)?;

        log::info!("Swapchain built: {}x{}, {} images, {:?}.", swapchain_extent.width, swapchain_extent.height, images.len(), present_mode);

        let result = VkSwapchain {
            handle, loader, present_queue, config, images,
            format: swapchain_format.format,
            dimension: swapchain_extent,
        };
        Ok(result)
    }

    pub fn config(&self) -> &SwapchainConfig {
        &self.config
    }

    pub fn images(&self) -> &[SwapchainImage] {
        &self.images
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Acquire an available presentable image, signaling `semaphore` once the image may be written.
    pub fn next_image(&self, semaphore: vk::Semaphore) -> Result<AcquiredImage, SwapchainSyncError> {

        let (index, is_suboptimal) = unsafe {
            self.loader.acquire_next_image(self.handle, self.config.image_acquire_time.into(), semaphore, vk::Fence::null())?
        };

        Ok(AcquiredImage { index, is_suboptimal })
    }

    /// Queue the image at `image_index` for presentation after `wait_semaphores` are signaled.
    ///
    /// Return true if the swapchain is suboptimal for the surface.
    pub fn present(&self, wait_semaphores: &[vk::Semaphore], image_index: vkuint) -> Result<bool, SwapchainSyncError> {

        let present_info = vk::PresentInfoKHR {
            s_type              : vk::StructureType::PRESENT_INFO_KHR,
            p_next              : ptr::null(),
            wait_semaphore_count: wait_semaphores.len() as _,
            p_wait_semaphores   : wait_semaphores.as_ptr(),
            swapchain_count     : 1,
            p_swapchains        : &self.handle,
            p_image_indices     : &image_index,
            p_results           : ptr::null_mut(),
        };

        let is_suboptimal = unsafe {
            self.loader.queue_present(self.present_queue.handle, &present_info)?
        };
        Ok(is_suboptimal)
    }

    /// Destroy the `vk::SwapchainKHR` object and the views of its images.
    ///
    /// All outstanding operations on images acquired from this swapchain must have completed.
    pub fn discard(&self, device: &VkDevice) {

        unsafe {
            for swapchain_image in self.images.iter() {
                device.logic.handle.destroy_image_view(swapchain_image.view, None);
            }

            self.loader.destroy_swapchain(self.handle, None);
        }
    }
}


// -----------------------------------------------------------------------------------
fn query_present_queue(device: &VkDevice, surface: &VkSurface) -> VkResult<VkQueue> {

    let graphics_queue = device.logic.graphics_queue;
    if surface.query_is_family_presentable(device.phy.handle, graphics_queue.family_index)? {
        Ok(graphics_queue)
    } else {
        Err(VkError::unsupported("Presentation on graphics queue"))
    }
}

fn obtain_swapchain_images(device: &VkDevice, swapchain: vk::SwapchainKHR, loader: &ash::extensions::khr::Swapchain, format: vk::Format) -> VkResult<Vec<SwapchainImage>> {

    let image_handles = unsafe {
        loader.get_swapchain_images(swapchain)
            .map_err(|_| VkError::query("Swapchain Images"))?
    };

    let mut result = Vec::with_capacity(image_handles.len());

    for image in image_handles.into_iter() {

        let view_ci = vk::ImageViewCreateInfo {
            s_type     : vk::StructureType::IMAGE_VIEW_CREATE_INFO,
            p_next     : ptr::null(),
            flags      : vk::ImageViewCreateFlags::empty(),
            image,
            view_type  : vk::ImageViewType::TYPE_2D,
            format,
            components : vk::ComponentMapping {
                r: vk::ComponentSwizzle::R,
                g: vk::ComponentSwizzle::G,
                b: vk::ComponentSwizzle::B,
                a: vk::ComponentSwizzle::A,
            },
            subresource_range: vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
        };

        let view = unsafe {
            device.logic.handle.create_image_view(&view_ci, None)
                .map_err(|_| VkError::create("Swapchain Image View"))?
        };

        result.push(SwapchainImage { image, view });
    }

    Ok(result)
}
// -----------------------------------------------------------------------------------

// -----------------------------------------------------------------------------------
fn choose_present_mode(available_modes: &[vk::PresentModeKHR], present_vsync: bool) -> vk::PresentModeKHR {

    // FIFO is always available and waits for the vertical blank.
    if present_vsync {
        return vk::PresentModeKHR::FIFO
    }

    // mailbox is the lowest latency non-tearing mode, then immediate.
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE].iter()
        .find(|mode| available_modes.contains(mode))
        .cloned()
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

fn choose_surface_format(support_formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {

    match support_formats {
        | [] => None,
        // a single UNDEFINED entry means the surface has no preferred format.
        | [only] if only.format == vk::Format::UNDEFINED => Some(vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: only.color_space,
        }),
        | _ => support_formats.iter()
            .find(|surface_format| surface_format.format == vk::Format::B8G8R8A8_UNORM)
            .or(support_formats.first())
            .cloned(),
    }
}

fn choose_extent(surface_caps: &vk::SurfaceCapabilitiesKHR, preference: vk::Extent2D) -> vk::Extent2D {

    // 0xFFFFFFFF means the size of the surface will be set by the swapchain.
    if surface_caps.current_extent.width == vkuint::MAX && surface_caps.current_extent.height == vkuint::MAX {
        vk::Extent2D {
            width : preference.width.clamp(surface_caps.min_image_extent.width, surface_caps.max_image_extent.width),
            height: preference.height.clamp(surface_caps.min_image_extent.height, surface_caps.max_image_extent.height),
        }
    } else {
        surface_caps.current_extent
    }
}

fn choose_image_count(surface_caps: &vk::SurfaceCapabilitiesKHR) -> vkuint {

    let desired_count = surface_caps.min_image_count + 1;
    // max_image_count of 0 means there is no limit.
    if surface_caps.max_image_count > 0 {
        desired_count.min(surface_caps.max_image_count)
    } else {
        desired_count
    }
}

fn choose_image_usage(surface_caps: &vk::SurfaceCapabilitiesKHR) -> vk::ImageUsageFlags {

    let transfer = vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST;
    vk::ImageUsageFlags::COLOR_ATTACHMENT | (surface_caps.supported_usage_flags & transfer)
}

fn choose_transform(surface_caps: &vk::SurfaceCapabilitiesKHR) -> vk::SurfaceTransformFlagsKHR {

    if surface_caps.supported_transforms.contains(vk::SurfaceTransformFlagsKHR::IDENTITY) {
        vk::SurfaceTransformFlagsKHR::IDENTITY
    } else {
        surface_caps.current_transform
    }
}

fn choose_composite_alpha(surface_caps: &vk::SurfaceCapabilitiesKHR) -> vk::CompositeAlphaFlagsKHR {

    const CANDIDATE_COMPOSITE_ALPHAS: [vk::CompositeAlphaFlagsKHR; 4] = [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::INHERIT,
    ];

    CANDIDATE_COMPOSITE_ALPHAS.iter()
        .find(|&&composite_alpha| surface_caps.supported_composite_alpha.contains(composite_alpha))
        .cloned()
        .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}
// -----------------------------------------------------------------------------------


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn statuses_are_classified() {

        assert_eq!(SwapchainSyncError::from(vk::Result::ERROR_OUT_OF_DATE_KHR), SwapchainSyncError::SurfaceOutDate);
        assert_eq!(SwapchainSyncError::from(vk::Result::TIMEOUT), SwapchainSyncError::TimeOut);
        assert_eq!(SwapchainSyncError::from(vk::Result::ERROR_DEVICE_LOST), SwapchainSyncError::Unknown(vk::Result::ERROR_DEVICE_LOST));

        let error = SwapchainSyncError::Unknown(vk::Result::ERROR_SURFACE_LOST_KHR).into_error("Present Image");
        assert!(!error.is_recoverable());
        assert!(error.to_string().starts_with("Present Image failed"));
    }

    #[test]
    fn vsync_forces_fifo() {

        let modes = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::MAILBOX);
        assert_eq!(choose_present_mode(&[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE], false), vk::PresentModeKHR::IMMEDIATE);
        assert_eq!(choose_present_mode(&[vk::PresentModeKHR::FIFO], false), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn surface_format_prefers_bgra_unorm() {

        let srgb = vk::SurfaceFormatKHR { format: vk::Format::R8G8B8A8_SRGB, color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR };
        let bgra = vk::SurfaceFormatKHR { format: vk::Format::B8G8R8A8_UNORM, color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR };
        let undefined = vk::SurfaceFormatKHR { format: vk::Format::UNDEFINED, color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR };

        assert_eq!(choose_surface_format(&[srgb, bgra]).unwrap().format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(choose_surface_format(&[srgb]).unwrap().format, vk::Format::R8G8B8A8_SRGB);
        assert_eq!(choose_surface_format(&[undefined]).unwrap().format, vk::Format::B8G8R8A8_UNORM);
        assert!(choose_surface_format(&[]).is_none());
    }

    #[test]
    fn extent_and_image_count_respect_capabilities() {

        let mut caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            current_extent: vk::Extent2D { width: 800, height: 600 },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 1024, height: 1024 },
            ..Default::default()
        };

        assert_eq!(choose_image_count(&caps), 2);
        assert_eq!(choose_extent(&caps, vk::Extent2D { width: 1280, height: 720 }), vk::Extent2D { width: 800, height: 600 });

        caps.max_image_count = 0;
        caps.current_extent = vk::Extent2D { width: vkuint::MAX, height: vkuint::MAX };
        assert_eq!(choose_image_count(&caps), 3);
        assert_eq!(choose_extent(&caps, vk::Extent2D { width: 1280, height: 720 }), vk::Extent2D { width: 1024, height: 720 });
    }
}

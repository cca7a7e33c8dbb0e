
use ash::vk;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

use crate::context::instance::VkInstance;
use crate::error::{VkResult, VkError};
use crate::vkuint;

/// Wrapper class for `vk::Surface`.
pub struct VkSurface {

    /// the handle of `vk::SurfaceKHR`.
    pub(crate) handle: vk::SurfaceKHR,
    /// the extension loader provides functions for creation and destruction of `vk::SurfaceKHR` object.
    loader: ash::extensions::khr::Surface,
}

impl VkSurface {

    /// Initialize surface extension loader and `vk::Surface` object.
    pub fn new(instance: &VkInstance, window: &winit::window::Window) -> VkResult<VkSurface> {

        let handle = unsafe {
            ash_window::create_surface(&instance.entry, &instance.handle, window.raw_display_handle(), window.raw_window_handle(), None)
                .map_err(|e| VkError::api("Platform Surface Creation", e))?
        };

        let loader = ash::extensions::khr::Surface::new(&instance.entry, &instance.handle);

        let surface = VkSurface { handle, loader };
        Ok(surface)
    }

    /// Query whether a queue family of a physical device supports presentation to this surface.
    pub fn query_is_family_presentable(&self, physical_device: vk::PhysicalDevice, queue_family_index: vkuint) -> VkResult<bool> {

        unsafe {
            self.loader.get_physical_device_surface_support(physical_device, queue_family_index, self.handle)
                .map_err(|e| VkError::api("Query Surface Support", e))
        }
    }

    /// Query the basic capabilities of a surface.
    pub fn query_capabilities(&self, physical_device: vk::PhysicalDevice) -> VkResult<vk::SurfaceCapabilitiesKHR> {

        unsafe {
            self.loader.get_physical_device_surface_capabilities(physical_device, self.handle)
                .map_err(|_| VkError::query("Surface Capabilities"))
        }
    }

    /// Query the supported swapchain format tuples for a surface.
    pub fn query_formats(&self, physical_device: vk::PhysicalDevice) -> VkResult<Vec<vk::SurfaceFormatKHR>> {

        unsafe {
            self.loader.get_physical_device_surface_formats(physical_device, self.handle)
                .map_err(|_| VkError::query("Surface Formats"))
        }
    }

    /// Query the supported presentation modes for a surface.
    pub fn query_present_modes(&self, physical_device: vk::PhysicalDevice) -> VkResult<Vec<vk::PresentModeKHR>> {

        unsafe {
            self.loader.get_physical_device_surface_present_modes(physical_device, self.handle)
                .map_err(|_| VkError::query("Surface Present Modes"))
        }
    }

    /// Destroy the `vk::SurfaceKHR` object.
    pub(crate) fn discard(&self) {

        unsafe {
            self.loader.destroy_surface(self.handle, None);
        }
    }
}


pub use self::device::{VkDevice, VkLogicalDevice, VkPhysicalDevice, VkQueue, VkObjectDiscardable};
pub use self::swapchain::{VkSwapchain, SwapchainImage, AcquiredImage, SwapchainSyncError};

pub use self::instance::InstanceConfig;
pub use self::debug::ValidationConfig;
pub use self::device::{LogicDevConfig, PhysicalDevConfig};
pub use self::swapchain::SwapchainConfig;

mod instance;
mod debug;
mod surface;
mod device;
mod swapchain;


use ash::vk;
use raw_window_handle::HasRawDisplayHandle;

use crate::workflow::WindowContext;
use crate::error::VkResult;

use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct VulkanConfig {

    pub instance  : InstanceConfig,
    pub debugger  : ValidationConfig,
    pub dev_logic : LogicDevConfig,
    pub dev_phy   : PhysicalDevConfig,
    pub swapchain : SwapchainConfig,
}

/// Everything needed to render to one window.
///
/// The device is shared with the frame pool, which releases its objects before the context is discarded.
pub struct VulkanContext {

    instance  : instance::VkInstance,
    debugger  : debug::VkDebugger,
    surface   : surface::VkSurface,

    pub swapchain: swapchain::VkSwapchain,
    pub device: Rc<device::VkDevice>,
}

impl VulkanContext {

    pub fn new(window: &WindowContext) -> VulkanContextBuilder {

        VulkanContextBuilder {
            window,
            config: VulkanConfig::default(),
        }
    }

    /// Replace the swapchain with one matching `dimension`.
    ///
    /// The device must be idle.
    pub fn recreate_swapchain(&mut self, dimension: vk::Extent2D) -> VkResult<()> {

        let config = self.swapchain.config().clone();
        let new_chain = swapchain::VkSwapchain::new(&self.instance, &self.device, &self.surface, config, dimension, Some(&self.swapchain))?;

        let old_chain = std::mem::replace(&mut self.swapchain, new_chain);
        old_chain.discard(&self.device);

        Ok(())
    }

    pub fn wait_idle(&self) -> VkResult<()> {
        self.device.wait_idle()
    }

    /// Destroy all Vulkan objects of the context in reverse creation order.
    pub fn discard(self) {

        self.swapchain.discard(&self.device);

        match Rc::try_unwrap(self.device) {
            | Ok(device) => device.discard_self(),
            | Err(_) => log::error!("Vulkan device is still shared at shutdown, skip its destruction."),
        }

        self.surface.discard();
        self.debugger.discard();
        self.instance.discard();
    }
}

pub struct VulkanContextBuilder<'a> {

    window: &'a WindowContext,
    config: VulkanConfig,
}

impl<'a> VulkanContextBuilder<'a> {

    pub fn with_config(mut self, config: VulkanConfig) -> VulkanContextBuilder<'a> {
        self.config = config; self
    }

    pub fn with_instance_config(mut self, config: InstanceConfig) -> VulkanContextBuilder<'a> {
        self.config.instance = config; self
    }

    pub fn with_debugger_config(mut self, config: ValidationConfig) -> VulkanContextBuilder<'a> {
        self.config.debugger = config; self
    }

    pub fn with_logic_device_config(mut self, config: LogicDevConfig) -> VulkanContextBuilder<'a> {
        self.config.dev_logic = config; self
    }

    pub fn with_physical_device_config(mut self, config: PhysicalDevConfig) -> VulkanContextBuilder<'a> {
        self.config.dev_phy = config; self
    }

    pub fn with_swapchain_config(mut self, config: SwapchainConfig) -> VulkanContextBuilder<'a> {
        self.config.swapchain = config; self
    }

    pub fn build(self) -> VkResult<VulkanContext> {

        let display = self.window.handle.raw_display_handle();

        let instance = instance::VkInstance::new(self.config.instance, &self.config.debugger, display)?;
        let debugger = debug::VkDebugger::new(&instance, &self.config.debugger)?;
        let surface = surface::VkSurface::new(&instance, &self.window.handle)?;

        let phy_device = device::VkPhysicalDevice::new(&instance, self.config.dev_phy)?;
        let logic_device = device::VkLogicalDevice::new(&instance, &phy_device, &surface, self.config.dev_logic)?;
        let device = device::VkDevice { logic: logic_device, phy: phy_device };

        let dimension = self.window.dimension();
        let swapchain = swapchain::VkSwapchain::new(&instance, &device, &surface, self.config.swapchain, dimension, None)?;

        let context = VulkanContext {
            instance, debugger, surface, swapchain,
            device: Rc::new(device),
        };
        Ok(context)
    }
}

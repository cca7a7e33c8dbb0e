
mod physical;
mod logical;

pub use self::logical::{VkLogicalDevice, VkQueue, LogicDevConfig};
pub use self::physical::{VkPhysicalDevice, PhysicalDevConfig};

use ash::vk;

use crate::ci::VkObjectBuildableCI;
use crate::error::{VkResult, VkError};


/// The selected GPU together with the logical device and queue created on it.
pub struct VkDevice {

    pub logic : logical::VkLogicalDevice,
    pub phy   : physical::VkPhysicalDevice,
}

impl VkDevice {

    #[inline]
    pub fn build<T>(&self, ci: &T) -> VkResult<T::ObjectType>
        where
            T: VkObjectBuildableCI {
        ci.build(self)
    }

    #[inline]
    pub fn discard(&self, object: impl VkObjectDiscardable) {
        object.discard_by(self);
    }

    /// Block until all outstanding operations on this device have finished.
    pub fn wait_idle(&self) -> VkResult<()> {

        unsafe {
            self.logic.handle.device_wait_idle()
                .map_err(|e| VkError::api("Device Waiting Idle", e))
        }
    }

    pub(crate) fn discard_self(&self) {
        self.logic.discard();
    }
}

/// Vulkan objects that can be destroyed with a `VkDevice`.
pub trait VkObjectDiscardable: Sized {

    fn discard_by(self, device: &VkDevice);
}

impl<'a, T> VkObjectDiscardable for &'a Vec<T>
    where
        T: VkObjectDiscardable + Copy {

    fn discard_by(self, device: &VkDevice) {
        for &object in self.iter() {
            object.discard_by(device);
        }
    }
}

macro_rules! impl_discardable {
    ($($object:ty => $destructor:ident,)*) => {
        $(
            impl VkObjectDiscardable for $object {

                fn discard_by(self, device: &VkDevice) {
                    unsafe {
                        device.logic.handle.$destructor(self, None);
                    }
                }
            }
        )*
    };
}

impl_discardable! {
    vk::Fence               => destroy_fence,
    vk::Semaphore           => destroy_semaphore,
    vk::CommandPool         => destroy_command_pool,
    vk::Buffer              => destroy_buffer,
    vk::DeviceMemory        => free_memory,
    vk::Image               => destroy_image,
    vk::ImageView           => destroy_image_view,
    vk::Framebuffer         => destroy_framebuffer,
    vk::RenderPass          => destroy_render_pass,
    vk::ShaderModule        => destroy_shader_module,
    vk::Pipeline            => destroy_pipeline,
    vk::PipelineLayout      => destroy_pipeline_layout,
    vk::DescriptorPool      => destroy_descriptor_pool,
    vk::DescriptorSetLayout => destroy_descriptor_set_layout,
}

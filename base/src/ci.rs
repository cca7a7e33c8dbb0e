//! Types which simplify the creation of Vulkan objects.

pub mod buffer;
pub mod command;
pub mod memory;
pub mod shader;
pub mod sync;


use crate::context::VkDevice;
use crate::VkResult;

pub(crate) trait VulkanCI<CI>: Sized {

    fn default_ci() -> CI;
}

/// Create-info wrappers that can build their object with a `VkDevice`.
pub trait VkObjectBuildableCI {
    type ObjectType;

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType>;
}

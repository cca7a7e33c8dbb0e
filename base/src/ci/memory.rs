//! Types which simplify the creation of Vulkan memory objects.

use ash::vk;

use crate::context::VkDevice;
use crate::ci::{VulkanCI, VkObjectBuildableCI};
use crate::utils::memory::get_memory_type_index;
use crate::error::{VkResult, VkError};
use crate::vkuint;

use std::ptr;

// ----------------------------------------------------------------------------------------------
/// Wrapper class for `vk::MemoryAllocateInfo`.
///
/// See [VkMemoryAllocateInfo](https://www.khronos.org/registry/vulkan/specs/1.3-extensions/man/html/VkMemoryAllocateInfo.html) for more detail.
#[derive(Debug, Clone)]
pub struct MemoryAI {
    inner: vk::MemoryAllocateInfo,
}

impl VulkanCI<vk::MemoryAllocateInfo> for MemoryAI {

    fn default_ci() -> vk::MemoryAllocateInfo {

        vk::MemoryAllocateInfo {
            s_type: vk::StructureType::MEMORY_ALLOCATE_INFO,
            p_next: ptr::null(),
            allocation_size  : 0,
            memory_type_index: 0,
        }
    }
}

impl VkObjectBuildableCI for MemoryAI {
    type ObjectType = vk::DeviceMemory;

    /// Allocate `vk::DeviceMemory` object, and return its handle.
    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        unsafe {
            device.logic.handle.allocate_memory(&self.inner, None)
                .map_err(|e| VkError::api("Memory Allocation", e))
        }
    }
}

impl MemoryAI {

    /// `memory_type_index` is the index identifying a memory type querying from Vulkan.
    pub fn new(allocation_size: vk::DeviceSize, memory_type_index: vkuint) -> MemoryAI {

        MemoryAI {
            inner: vk::MemoryAllocateInfo {
                allocation_size, memory_type_index,
                ..MemoryAI::default_ci()
            },
        }
    }

    /// Select the memory type for `requirement` that supports `properties`.
    pub fn from_requirement(device: &VkDevice, requirement: &vk::MemoryRequirements, properties: vk::MemoryPropertyFlags) -> VkResult<MemoryAI> {

        let memory_type_index = get_memory_type_index(&device.phy.memories, requirement.memory_type_bits, properties)?;
        Ok(MemoryAI::new(requirement.size, memory_type_index))
    }
}
// ----------------------------------------------------------------------------------------------


use ash::vk;

use crate::context::VkDevice;
use crate::ci::{VulkanCI, VkObjectBuildableCI};
use crate::error::{VkResult, VkError};
use crate::vkbytes;

use std::ptr;

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::BufferCreateInfo.
///
/// Building it returns the buffer handle and its memory requirement.
#[derive(Debug, Clone)]
pub struct BufferCI {
    inner: vk::BufferCreateInfo,
}

impl VulkanCI<vk::BufferCreateInfo> for BufferCI {

    fn default_ci() -> vk::BufferCreateInfo {

        vk::BufferCreateInfo {
            s_type: vk::StructureType::BUFFER_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::BufferCreateFlags::empty(),
            size  : 0,
            usage : vk::BufferUsageFlags::empty(),
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            queue_family_index_count: 0,
            p_queue_family_indices  : ptr::null(),
        }
    }
}

impl VkObjectBuildableCI for BufferCI {
    type ObjectType = (vk::Buffer, vk::MemoryRequirements);

    fn build(&self, device: &VkDevice) -> VkResult<Self::ObjectType> {

        let buffer = unsafe {
            device.logic.handle.create_buffer(&self.inner, None)
                .map_err(|e| VkError::api("Buffer Creation", e))?
        };

        let requirement = unsafe {
            device.logic.handle.get_buffer_memory_requirements(buffer)
        };

        Ok((buffer, requirement))
    }
}

impl BufferCI {

    pub fn new(size: vkbytes) -> BufferCI {

        BufferCI {
            inner: vk::BufferCreateInfo {
                size,
                ..BufferCI::default_ci()
            },
        }
    }

    #[inline(always)]
    pub fn usage(mut self, flags: vk::BufferUsageFlags) -> BufferCI {
        self.inner.usage = flags; self
    }
}

/// Bind `memory` to `buffer` at `offset`.
pub fn bind_buffer_memory(device: &VkDevice, buffer: vk::Buffer, memory: vk::DeviceMemory, offset: vkbytes) -> VkResult<()> {

    unsafe {
        device.logic.handle.bind_buffer_memory(buffer, memory, offset)
            .map_err(|e| VkError::api("Binding Buffer Memory", e))
    }
}
// ----------------------------------------------------------------------------------------------

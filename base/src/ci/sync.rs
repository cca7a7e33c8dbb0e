
use ash::vk;

use crate::context::VkDevice;
use crate::ci::{VulkanCI, VkObjectBuildableCI};
use crate::error::{VkResult, VkError};

use std::ptr;

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::SemaphoreCreateInfo.
#[derive(Debug, Clone)]
pub struct SemaphoreCI {
    ci: vk::SemaphoreCreateInfo,
}

impl VulkanCI<vk::SemaphoreCreateInfo> for SemaphoreCI {

    fn default_ci() -> vk::SemaphoreCreateInfo {

        vk::SemaphoreCreateInfo {
            s_type: vk::StructureType::SEMAPHORE_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::SemaphoreCreateFlags::empty(),
        }
    }
}

impl SemaphoreCI {

    pub fn new() -> SemaphoreCI {

        SemaphoreCI {
            ci: SemaphoreCI::default_ci(),
        }
    }
}

impl VkObjectBuildableCI for SemaphoreCI {
    type ObjectType = vk::Semaphore;

    fn build(&self, device: &VkDevice) -> VkResult<vk::Semaphore> {

        unsafe {
            device.logic.handle.create_semaphore(&self.ci, None)
                .map_err(|e| VkError::api("Semaphore Creation", e))
        }
    }
}
// ----------------------------------------------------------------------------------------------

// ----------------------------------------------------------------------------------------------
/// Wrapper class for vk::FenceCreateInfo.
#[derive(Debug, Clone)]
pub struct FenceCI {
    ci: vk::FenceCreateInfo,
}

impl VulkanCI<vk::FenceCreateInfo> for FenceCI {

    fn default_ci() -> vk::FenceCreateInfo {

        vk::FenceCreateInfo {
            s_type: vk::StructureType::FENCE_CREATE_INFO,
            p_next: ptr::null(),
            flags : vk::FenceCreateFlags::empty(),
        }
    }
}

impl FenceCI {

    /// Set `is_signaled` to create the fence in signaled state.
    pub fn new(is_signaled: bool) -> FenceCI {

        let mut fence = FenceCI { ci: FenceCI::default_ci() };

        if is_signaled {
            fence.ci.flags = vk::FenceCreateFlags::SIGNALED;
        }

        fence
    }
}

impl VkObjectBuildableCI for FenceCI {
    type ObjectType = vk::Fence;

    fn build(&self, device: &VkDevice) -> VkResult<vk::Fence> {

        unsafe {
            device.logic.handle.create_fence(&self.ci, None)
                .map_err(|e| VkError::api("Fence Creation", e))
        }
    }
}
// ----------------------------------------------------------------------------------------------

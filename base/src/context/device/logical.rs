
use ash::vk;

use crate::context::instance::VkInstance;
use crate::context::surface::VkSurface;
use crate::context::device::physical::VkPhysicalDevice;
use crate::utils::cast::cstrings2ptrs;
use crate::error::{VkResult, VkError};
use crate::{vkuint, vkfloat};

use std::ptr;


#[derive(Debug, Clone)]
pub struct LogicDevConfig {

    /// the priority of the graphics queue, in range [0.0, 1.0].
    pub graphics_priority: vkfloat,
}

impl Default for LogicDevConfig {

    fn default() -> LogicDevConfig {
        LogicDevConfig {
            graphics_priority: 1.0,
        }
    }
}

pub struct VkLogicalDevice {

    pub handle: ash::Device,
    /// the queue used for both rendering and presentation.
    pub graphics_queue: VkQueue,
}

#[derive(Debug, Clone, Copy)]
pub struct VkQueue {
    pub handle: vk::Queue,
    pub family_index: vkuint,
}

impl VkLogicalDevice {

    pub fn new(instance: &VkInstance, phy: &VkPhysicalDevice, surface: &VkSurface, config: LogicDevConfig) -> VkResult<VkLogicalDevice> {

        let family_index = query_graphics_family(instance, phy, surface)?;
        let priorities = [config.graphics_priority];

        let queue_cis = [
            vk::DeviceQueueCreateInfo {
                s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
                p_next: ptr::null(),
                flags : vk::DeviceQueueCreateFlags::empty(),
                queue_family_index: family_index,
                queue_count       : priorities.len() as _,
                p_queue_priorities: priorities.as_ptr(),
            },
        ];

        let enable_layer_names = cstrings2ptrs(&instance.enable_layer_names);
        let enable_extension_names = cstrings2ptrs(phy.enable_extensions());

        let device_ci = vk::DeviceCreateInfo {
            s_type                     : vk::StructureType::DEVICE_CREATE_INFO,
            p_next                     : ptr::null(),
            flags                      : vk::DeviceCreateFlags::empty(),
            queue_create_info_count    : queue_cis.len() as _,
            p_queue_create_infos       : queue_cis.as_ptr(),
            enabled_layer_count        : enable_layer_names.len() as _,
            pp_enabled_layer_names     : enable_layer_names.as_ptr(),
            enabled_extension_count    : enable_extension_names.len() as _,
            pp_enabled_extension_names : enable_extension_names.as_ptr(),
            p_enabled_features         : phy.enable_features(),
        };

        let handle = unsafe {
            instance.handle.create_device(phy.handle, &device_ci, None)
                .map_err(|e| VkError::api("Logical Device Creation", e))?
        };

        let graphics_queue = VkQueue {
            handle: unsafe { handle.get_device_queue(family_index, 0) },
            family_index,
        };

        let device = VkLogicalDevice { handle, graphics_queue };
        Ok(device)
    }

    pub fn discard(&self) {

        unsafe {
            self.handle.destroy_device(None);
        }
    }
}

/// Find a queue family supporting graphics commands and presentation to `surface`.
fn query_graphics_family(instance: &VkInstance, phy: &VkPhysicalDevice, surface: &VkSurface) -> VkResult<vkuint> {

    let families = unsafe {
        instance.handle.get_physical_device_queue_family_properties(phy.handle)
    };

    for (family_index, family) in families.iter().enumerate() {

        let family_index = family_index as vkuint;
        if family.queue_count > 0
            && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
            && surface.query_is_family_presentable(phy.handle, family_index)? {
            return Ok(family_index)
        }
    }

    Err(VkError::unsupported("Graphics queue with presentation"))
}

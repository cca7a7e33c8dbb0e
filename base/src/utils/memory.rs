
use ash::vk;

use crate::error::{VkResult, VkError};
use crate::vkuint;

/// Find the first memory type allowed by `type_bits` whose flags contain `properties`.
///
/// `type_bits` is the `memory_type_bits` field of `vk::MemoryRequirements`.
pub fn get_memory_type_index(memories: &vk::PhysicalDeviceMemoryProperties, type_bits: vkuint, properties: vk::MemoryPropertyFlags) -> VkResult<vkuint> {

    let available_types = &memories.memory_types[..(memories.memory_type_count as usize)];

    available_types.iter().enumerate()
        .find(|(i, memory_type)| {
            (type_bits >> i) & 1 == 1 && memory_type.property_flags.contains(properties)
        })
        .map(|(i, _)| i as vkuint)
        .ok_or_else(|| VkError::memory_type(type_bits, properties))
}

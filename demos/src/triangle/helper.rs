
use ash::vk;

use vkbase::context::VkDevice;
use vkbase::ci::command::CommandBufferAI;
use vkbase::ci::sync::FenceCI;
use vkbase::utils::time::VkTimeDuration;
use vkbase::{VkResult, VkError};

use std::ptr;

/// Allocate a command buffer from `pool` and start recording it for a single submission.
pub fn begin_single_command(device: &VkDevice, pool: vk::CommandPool) -> VkResult<vk::CommandBuffer> {

    let command = device.build(&CommandBufferAI::new(pool, 1))?
        .pop()
        .ok_or_else(|| VkError::other("No command buffer was allocated."))?;

    let begin_info = vk::CommandBufferBeginInfo {
        s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
        p_next: ptr::null(),
        flags: vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
        p_inheritance_info: ptr::null(),
    };

    unsafe {
        device.logic.handle.begin_command_buffer(command, &begin_info)
            .map_err(|e| VkError::api("Begin Command Buffer", e))?;
    }

    Ok(command)
}

/// End `command`, submit it to the graphics queue and wait until it has finished executing.
///
/// The command buffer is freed afterwards.
pub fn flush_command_buffer(device: &VkDevice, pool: vk::CommandPool, command: vk::CommandBuffer, timeout: VkTimeDuration) -> VkResult<()> {

    debug_assert_ne!(command, vk::CommandBuffer::null());

    unsafe {
        device.logic.handle.end_command_buffer(command)
            .map_err(|e| VkError::api("End Command Buffer", e))?;
    }

    let submit_info = vk::SubmitInfo {
        s_type: vk::StructureType::SUBMIT_INFO,
        p_next: ptr::null(),
        wait_semaphore_count   : 0,
        p_wait_semaphores      : ptr::null(),
        p_wait_dst_stage_mask  : ptr::null(),
        command_buffer_count   : 1,
        p_command_buffers      : &command,
        signal_semaphore_count : 0,
        p_signal_semaphores    : ptr::null(),
    };

    // Create fence to ensure that the command buffer has finished executing.
    let fence = device.build(&FenceCI::new(false))?;

    let result = unsafe {
        device.logic.handle.queue_submit(device.logic.graphics_queue.handle, &[submit_info], fence)
            .map_err(|e| VkError::api("Queue Submit", e))
            .and_then(|_| {
                device.logic.handle.wait_for_fences(&[fence], true, timeout.into())
                    .map_err(|e| match e {
                        | vk::Result::TIMEOUT => VkError::timeout("Upload Fence Waiting"),
                        | _ => VkError::api("Upload Fence Waiting", e),
                    })
            })
    };

    // on timeout the command may still be pending, so only release it once it is known to be done.
    if result.is_ok() {
        device.discard(fence);
        unsafe {
            device.logic.handle.free_command_buffers(pool, &[command]);
        }
    }

    result
}


use ash::vk;

use crate::context::{VkDevice, VkSwapchain, AcquiredImage, SwapchainSyncError};
use crate::ci::buffer::{BufferCI, bind_buffer_memory};
use crate::ci::command::{CommandPoolCI, CommandBufferAI};
use crate::ci::memory::MemoryAI;
use crate::ci::sync::{FenceCI, SemaphoreCI};
use crate::frame::UniformRegion;
use crate::utils::time::VkTimeDuration;
use crate::error::{VkResult, VkError};
use crate::{vkuint, vkbytes};

use std::ptr;

/// One batch of work handed to the graphics queue by the frame loop.
#[derive(Debug, Clone, Copy)]
pub struct FrameSubmission {

    pub command: vk::CommandBuffer,
    /// the batch does not start `wait_stage` until this semaphore is signaled.
    pub wait_semaphore: vk::Semaphore,
    pub wait_stage: vk::PipelineStageFlags,
    /// signaled when the batch finishes executing.
    pub signal_semaphore: vk::Semaphore,
    /// signaled when the batch finishes executing.
    pub fence: vk::Fence,
}

/// The device operations the frame pool and the frame loop rely on.
pub trait FrameDevice {

    fn create_fence(&self, is_signaled: bool) -> VkResult<vk::Fence>;
    fn destroy_fence(&self, fence: vk::Fence);

    fn create_semaphore(&self) -> VkResult<vk::Semaphore>;
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    fn create_command_pool(&self) -> VkResult<vk::CommandPool>;
    /// Destroy the pool and every command buffer allocated from it.
    fn destroy_command_pool(&self, pool: vk::CommandPool);
    fn allocate_commands(&self, pool: vk::CommandPool, count: usize) -> VkResult<Vec<vk::CommandBuffer>>;

    /// Create a host visible uniform buffer of `size` bytes that stays mapped until destroyed.
    fn create_uniform_region(&self, size: vkbytes) -> VkResult<UniformRegion>;
    fn destroy_uniform_region(&self, region: UniformRegion);

    /// Block until `fence` is signaled.
    ///
    /// Return a timeout error if `timeout` expires first.
    fn wait_fence(&self, fence: vk::Fence, timeout: VkTimeDuration) -> VkResult<()>;
    fn reset_fence(&self, fence: vk::Fence) -> VkResult<()>;

    /// Reset `command` and start recording it for one submission.
    fn begin_commands(&self, command: vk::CommandBuffer) -> VkResult<()>;
    fn end_commands(&self, command: vk::CommandBuffer) -> VkResult<()>;

    fn submit(&self, submission: &FrameSubmission) -> VkResult<()>;
    fn wait_idle(&self) -> VkResult<()>;
}

/// The presentation engine side of a frame.
pub trait FramePresenter {

    /// Request the next presentable image, `signal` is signaled once the image may be written.
    fn acquire_image(&self, signal: vk::Semaphore) -> Result<AcquiredImage, SwapchainSyncError>;
    /// Queue the image at `image_index` for display after `wait` is signaled.
    ///
    /// Return true if the swapchain no longer matches the surface exactly.
    fn present_image(&self, wait: vk::Semaphore, image_index: vkuint) -> Result<bool, SwapchainSyncError>;
    fn dimension(&self) -> vk::Extent2D;
}

impl FrameDevice for VkDevice {

    fn create_fence(&self, is_signaled: bool) -> VkResult<vk::Fence> {
        self.build(&FenceCI::new(is_signaled))
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        self.discard(fence);
    }

    fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
        self.build(&SemaphoreCI::new())
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.discard(semaphore);
    }

    fn create_command_pool(&self) -> VkResult<vk::CommandPool> {
        self.build(&CommandPoolCI::new(self.logic.graphics_queue.family_index))
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.discard(pool);
    }

    fn allocate_commands(&self, pool: vk::CommandPool, count: usize) -> VkResult<Vec<vk::CommandBuffer>> {
        self.build(&CommandBufferAI::new(pool, count as vkuint))
    }

    fn create_uniform_region(&self, size: vkbytes) -> VkResult<UniformRegion> {

        let buffer_ci = BufferCI::new(size)
            .usage(vk::BufferUsageFlags::UNIFORM_BUFFER);
        let (buffer, requirement) = self.build(&buffer_ci)?;

        let memory_ai = MemoryAI::from_requirement(self, &requirement, vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT);
        let memory = match memory_ai.and_then(|ai| self.build(&ai)) {
            | Ok(memory) => memory,
            | Err(e) => {
                self.discard(buffer);
                return Err(e)
            },
        };

        let mapped = bind_buffer_memory(self, buffer, memory, 0).and_then(|_| unsafe {
            self.logic.handle.map_memory(memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
                .map_err(|e| VkError::api("Map Memory", e))
        });

        let region = mapped.and_then(|data_ptr| unsafe {
            UniformRegion::from_raw_parts(buffer, memory, data_ptr as *mut u8, size as usize)
        });

        if region.is_err() {
            self.discard(buffer);
            self.discard(memory);
        }
        region
    }

    fn destroy_uniform_region(&self, region: UniformRegion) {

        unsafe {
            self.logic.handle.unmap_memory(region.memory());
        }
        self.discard(region.buffer());
        self.discard(region.memory());
    }

    fn wait_fence(&self, fence: vk::Fence, timeout: VkTimeDuration) -> VkResult<()> {

        unsafe {
            self.logic.handle.wait_for_fences(&[fence], true, timeout.into())
                .map_err(|e| match e {
                    | vk::Result::TIMEOUT => VkError::timeout("Fence Waiting"),
                    | _ => VkError::api("Fence Waiting", e),
                })
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {

        unsafe {
            self.logic.handle.reset_fences(&[fence])
                .map_err(|e| VkError::api("Fence Resetting", e))
        }
    }

    fn begin_commands(&self, command: vk::CommandBuffer) -> VkResult<()> {

        let begin_ci = vk::CommandBufferBeginInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
            p_next: ptr::null(),
            flags : vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            p_inheritance_info: ptr::null(),
        };

        unsafe {
            self.logic.handle.reset_command_buffer(command, vk::CommandBufferResetFlags::empty())
                .map_err(|e| VkError::api("Command Buffer Resetting", e))?;
            self.logic.handle.begin_command_buffer(command, &begin_ci)
                .map_err(|e| VkError::api("Begin Command Buffer", e))
        }
    }

    fn end_commands(&self, command: vk::CommandBuffer) -> VkResult<()> {

        unsafe {
            self.logic.handle.end_command_buffer(command)
                .map_err(|e| VkError::api("End Command Buffer", e))
        }
    }

    fn submit(&self, submission: &FrameSubmission) -> VkResult<()> {

        let submit_info = vk::SubmitInfo {
            s_type: vk::StructureType::SUBMIT_INFO,
            p_next: ptr::null(),
            wait_semaphore_count   : 1,
            p_wait_semaphores      : &submission.wait_semaphore,
            p_wait_dst_stage_mask  : &submission.wait_stage,
            command_buffer_count   : 1,
            p_command_buffers      : &submission.command,
            signal_semaphore_count : 1,
            p_signal_semaphores    : &submission.signal_semaphore,
        };

        unsafe {
            self.logic.handle.queue_submit(self.logic.graphics_queue.handle, &[submit_info], submission.fence)
                .map_err(|e| VkError::api("Queue Submit", e))
        }
    }

    fn wait_idle(&self) -> VkResult<()> {
        VkDevice::wait_idle(self)
    }
}

impl FramePresenter for VkSwapchain {

    fn acquire_image(&self, signal: vk::Semaphore) -> Result<AcquiredImage, SwapchainSyncError> {
        self.next_image(signal)
    }

    fn present_image(&self, wait: vk::Semaphore, image_index: vkuint) -> Result<bool, SwapchainSyncError> {
        self.present(&[wait], image_index)
    }

    fn dimension(&self) -> vk::Extent2D {
        self.dimension
    }
}

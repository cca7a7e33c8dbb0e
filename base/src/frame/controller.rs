
use ash::vk;

use crate::context::SwapchainSyncError;
use crate::frame::{FrameDevice, FramePresenter, FrameSubmission, FramePool, FrameConfig, UniformRegion};
use crate::utils::frame::{FrameCounter, FrameAction};
use crate::utils::time::VkTimeDuration;
use crate::error::{VkResult, VkError};
use crate::vkuint;

use std::rc::Rc;

/// Describe the frame being produced.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {

    /// index of the frame slot in use, in range [0, frame_in_flight).
    pub frame_index: usize,
    /// index of the acquired swapchain image.
    pub image_index: vkuint,
    pub dimension: vk::Extent2D,
    /// seconds elapsed since the previous frame.
    pub delta_time: f32,
}

/// The application side of a frame: what to write into the uniforms and what to draw.
pub trait FrameRecorder<D: ?Sized> {

    /// Called once the slot's previous submission has completed, so `uniforms` is not read by the GPU.
    fn update_uniforms(&mut self, frame: &FrameInfo, uniforms: &mut UniformRegion) -> VkResult<()>;

    /// Record the draw commands of this frame, `command` is already in recording state.
    fn record_commands(&mut self, device: &D, frame: &FrameInfo, command: vk::CommandBuffer) -> VkResult<()>;
}

/// Drive one frame at a time through the slots of a `FramePool`.
pub struct FrameLoop<D: FrameDevice> {

    frames: FramePool<D>,
    counter: FrameCounter,
    fence_timeout: VkTimeDuration,
}

impl<D: FrameDevice> FrameLoop<D> {

    pub fn new(device: Rc<D>, config: &FrameConfig) -> VkResult<FrameLoop<D>> {

        let frames = FramePool::new(device, config)?;

        let frame_loop = FrameLoop {
            counter: FrameCounter::new(frames.len()),
            fence_timeout: config.fence_timeout,
            frames,
        };
        Ok(frame_loop)
    }

    /// The index of the slot the next call to `render_frame` will use.
    #[inline]
    pub fn frame_index(&self) -> usize {
        self.counter.current_frame()
    }

    #[inline]
    pub fn frames(&self) -> &FramePool<D> {
        &self.frames
    }

    /// Produce one frame.
    ///
    /// Return `FrameAction::SwapchainRecreate` if the swapchain must be rebuilt before the next frame.
    /// A timed out fence wait returns a recoverable error and leaves the frame index unchanged.
    pub fn render_frame<P, R>(&mut self, presenter: &P, recorder: &mut R, delta_time: f32) -> VkResult<FrameAction>
        where
            P: FramePresenter,
            R: FrameRecorder<D> {

        let frame_index = self.counter.current_frame();
        let device = Rc::clone(self.frames.device());
        let slot = self.frames.get_mut(frame_index);

        device.wait_fence(slot.completion_fence, self.fence_timeout)?;

        let acquired = match presenter.acquire_image(slot.image_acquired) {
            | Ok(acquired) => acquired,
            | Err(SwapchainSyncError::SurfaceOutDate) => {
                // nothing has been submitted, so the fence stays signaled for the next attempt.
                log::debug!("Swapchain is out of date when acquiring image for frame {}.", frame_index);
                return Ok(FrameAction::SwapchainRecreate)
            },
            | Err(SwapchainSyncError::TimeOut) => {
                return Err(VkError::timeout("Acquire Next Image"))
            },
            | Err(e) => return Err(e.into_error("Acquire Next Image")),
        };

        let frame = FrameInfo {
            frame_index,
            image_index: acquired.index,
            dimension: presenter.dimension(),
            delta_time,
        };

        recorder.update_uniforms(&frame, &mut slot.uniforms)?;

        device.begin_commands(slot.command)?;
        recorder.record_commands(&device, &frame, slot.command)?;
        device.end_commands(slot.command)?;

        device.reset_fence(slot.completion_fence)?;

        let submission = FrameSubmission {
            command: slot.command,
            wait_semaphore: slot.image_acquired,
            wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            signal_semaphore: slot.render_finished,
            fence: slot.completion_fence,
        };
        if let Err(e) = device.submit(&submission) {
            // the reset fence has no pending work to signal it, so swap in a signaled one for the next attempt.
            let fence = device.create_fence(true)?;
            device.destroy_fence(slot.completion_fence);
            slot.completion_fence = fence;
            return Err(e)
        }

        let presented = presenter.present_image(slot.render_finished, acquired.index);

        // the slot has been handed to the GPU whatever presentation reports.
        self.counter.next_frame();

        match presented {
            | Ok(is_suboptimal) if is_suboptimal || acquired.is_suboptimal => {
                log::debug!("Swapchain is suboptimal for the surface after frame {}.", frame_index);
                Ok(FrameAction::SwapchainRecreate)
            },
            | Ok(_) => Ok(FrameAction::Rendering),
            | Err(SwapchainSyncError::SurfaceOutDate) => {
                log::debug!("Swapchain is out of date when presenting frame {}.", frame_index);
                Ok(FrameAction::SwapchainRecreate)
            },
            | Err(e) => Err(e.into_error("Queue Present")),
        }
    }
}

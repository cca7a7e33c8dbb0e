
pub use self::window::{WindowContext, WindowConfig, WindowMode};
pub use self::loops::ProcPipeline;

mod window;
mod loops;


use crate::context::{VkDevice, VkSwapchain};
use crate::frame::{FrameRecorder, FramePool};
use crate::input::EventController;
use crate::utils::frame::FrameAction;
use crate::error::VkResult;

/// The hooks an application provides to `ProcPipeline`.
///
/// Rendering itself goes through `FrameRecorder`, which is called once per frame by the frame loop.
pub trait Workflow: FrameRecorder<VkDevice> {

    /// Called once before the first frame, after all frame slots have been created.
    fn prepare(&mut self, _device: &VkDevice, _frames: &FramePool<VkDevice>) -> VkResult<()> {
        Ok(())
    }

    /// Called after the swapchain has been rebuilt, usually because the window was resized.
    fn swapchain_reload(&mut self, _device: &VkDevice, _swapchain: &VkSwapchain) -> VkResult<()> {
        Ok(())
    }

    fn receive_input(&mut self, inputer: &EventController, delta_time: f32) -> FrameAction;

    /// Called once after the device has become idle, release all application objects here.
    fn deinit(&mut self, device: &VkDevice) -> VkResult<()>;
}

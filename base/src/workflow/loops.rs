
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};

use crate::context::VulkanContext;
use crate::frame::{FrameLoop, FrameConfig};
use crate::workflow::Workflow;
use crate::workflow::window::WindowContext;
use crate::input::EventController;
use crate::utils::frame::FrameAction;
use crate::context::VkDevice;
use crate::error::VkResult;

use std::rc::Rc;
use std::time::Duration;

/// How long to block on window events while there is nothing to render.
const MINIMIZED_POLL_INTERVAL: Duration = Duration::from_millis(50);


pub struct ProcPipeline {

    window: WindowContext,
    vulkan: VulkanContext,

    frames: FrameLoop<VkDevice>,
}

impl ProcPipeline {

    pub fn new(window: WindowContext, vulkan: VulkanContext, config: FrameConfig) -> VkResult<ProcPipeline> {

        let frames = match FrameLoop::new(Rc::clone(&vulkan.device), &config) {
            | Ok(frames) => frames,
            | Err(e) => {
                vulkan.discard();
                return Err(e)
            },
        };
        log::info!("Rendering with {} frames in flight.", frames.frames().len());

        let target = ProcPipeline { window, vulkan, frames };
        Ok(target)
    }

    /// The context the app creates its objects with.
    pub fn vulkan(&self) -> &VulkanContext {
        &self.vulkan
    }

    pub fn frame_in_flight(&self) -> usize {
        self.frames.frames().len()
    }

    /// Run `app` until the window is closed or the app requests to quit.
    ///
    /// All resources are released before returning, even if the loop failed.
    pub fn launch(mut self, mut app: impl Workflow) -> VkResult<()> {

        let result = app.prepare(&self.vulkan.device, self.frames.frames())
            .and_then(|_| self.main_loop(&mut app));

        if let Err(ref e) = result {
            log::error!("Render loop stopped: {}", e);
        }

        let teardown = self.teardown(app);
        result.and(teardown)
    }

    fn main_loop(&mut self, app: &mut impl Workflow) -> VkResult<()> {

        let mut event_handler = EventController::default();

        'loop_marker: loop {

            macro_rules! response_feedback {
                ($action:ident) => {
                    match $action {
                        | FrameAction::Rendering => {},
                        | FrameAction::SwapchainRecreate => {
                            self.reload_swapchain(app)?;
                        },
                        | FrameAction::Terminal => {
                            break 'loop_marker
                        },
                    }
                }
            }

            let delta_time = event_handler.fps_counter.delta_time();

            let poll_timeout = if self.window.is_minimized() { MINIMIZED_POLL_INTERVAL } else { Duration::ZERO };
            let status = self.window.event_loop.pump_events(Some(poll_timeout), |event, _| {
                event_handler.record_event(&event);
            });

            if let PumpStatus::Exit(code) = status {
                log::info!("Event loop exited with code {}.", code);
                break 'loop_marker
            }

            let window_feedback = event_handler.current_action();
            response_feedback!(window_feedback);

            let input_feedback = app.receive_input(&event_handler, delta_time);
            response_feedback!(input_feedback);

            if self.window.is_minimized() {
                event_handler.tick_frame();
                continue
            }

            let render_feedback = match self.frames.render_frame(&self.vulkan.swapchain, app, delta_time) {
                | Ok(action) => action,
                | Err(e) if e.is_recoverable() => {
                    log::warn!("Skip frame {}: {}", self.frames.frame_index(), e);
                    FrameAction::Rendering
                },
                | Err(e) => return Err(e),
            };
            response_feedback!(render_feedback);

            event_handler.tick_frame();
        }

        Ok(())
    }

    fn reload_swapchain(&mut self, app: &mut impl Workflow) -> VkResult<()> {

        // a zero sized swapchain can not be created, the resize event after restoring triggers the rebuild.
        if self.window.is_minimized() {
            return Ok(())
        }

        self.vulkan.wait_idle()?;

        let dimension = self.window.dimension();
        self.vulkan.recreate_swapchain(dimension)?;
        log::debug!("Swapchain rebuilt with dimension {}x{}.", self.vulkan.swapchain.dimension.width, self.vulkan.swapchain.dimension.height);

        app.swapchain_reload(&self.vulkan.device, &self.vulkan.swapchain)
    }

    fn teardown(self, mut app: impl Workflow) -> VkResult<()> {

        if let Err(e) = self.vulkan.wait_idle() {
            log::error!("Failed to wait for device idle at shutdown: {}", e);
        }

        let deinit = app.deinit(&self.vulkan.device);
        // free the program specific resource.
        drop(app);
        self.discard();

        deinit
    }

    /// Release the frame slots, the Vulkan context and the window without running an app.
    ///
    /// Objects created from `vulkan()` must have been destroyed before.
    pub fn discard(self) {

        let ProcPipeline { window, vulkan, frames } = self;

        // the frame slots hold the last reference to the device besides the context.
        drop(frames);
        // and then free vulkan context resource.
        vulkan.discard();
        drop(window);
    }
}

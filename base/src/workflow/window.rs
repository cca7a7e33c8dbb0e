
use ash::vk;
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::error::{VkResult, VkError};

#[derive(Debug, Clone)]
pub struct WindowConfig {

    pub title: String,
    pub mode: WindowMode,

    /// the initial inner size of window, in logical pixels.
    pub dimension: vk::Extent2D,
    pub max_dimension: Option<vk::Extent2D>,
    pub min_dimension: Option<vk::Extent2D>,

    pub is_resizable: bool,
}

impl Default for WindowConfig {

    fn default() -> WindowConfig {

        WindowConfig {
            title: String::from("Vulkan Example"),
            mode: WindowMode::Normal,

            dimension: vk::Extent2D {
                width : 1280,
                height: 720,
            },
            max_dimension: None,
            min_dimension: None,

            is_resizable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WindowMode {
    Normal,
    Maximized,
    /// borderless fullscreen on the current monitor.
    Fullscreen,
}


pub struct WindowContext {

    pub(crate) event_loop: EventLoop<()>,
    pub(crate) handle: Window,
}

impl WindowContext {

    pub fn new(config: WindowConfig) -> VkResult<WindowContext> {

        let event_loop = EventLoop::new()
            .map_err(|e| VkError::window(e.to_string()))?;

        let mut builder = WindowBuilder::new()
            .with_title(config.title)
            .with_inner_size(LogicalSize::new(config.dimension.width, config.dimension.height))
            .with_resizable(config.is_resizable);

        if let Some(min) = config.min_dimension {
            builder = builder.with_min_inner_size(LogicalSize::new(min.width, min.height));
        }

        if let Some(max) = config.max_dimension {
            builder = builder.with_max_inner_size(LogicalSize::new(max.width, max.height));
        }

        builder = match config.mode {
            | WindowMode::Maximized => {
                builder.with_maximized(true)
            },
            | WindowMode::Fullscreen => {
                builder.with_fullscreen(Some(Fullscreen::Borderless(None)))
            },
            | WindowMode::Normal => {
                builder
            },
        };

        let window = WindowContext {
            handle: builder.build(&event_loop)
                .map_err(|e| VkError::window(e.to_string()))?,
            event_loop,
        };
        Ok(window)
    }

    /// The current inner size of window, in physical pixels.
    pub fn dimension(&self) -> vk::Extent2D {

        let size = self.handle.inner_size();
        vk::Extent2D {
            width : size.width,
            height: size.height,
        }
    }

    /// A minimized window has no drawable area, so nothing can be presented to it.
    pub fn is_minimized(&self) -> bool {

        let dimension = self.dimension();
        dimension.width == 0 || dimension.height == 0
    }
}

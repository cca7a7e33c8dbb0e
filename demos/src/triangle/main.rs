
//! Vulkan Example - Basic indexed triangle rendering
//!
//! This example shows how to set Vulkan up to display something, with two frames being processed concurrently.
//! The initializations of vk::Instance, vk::Device and vk::SwapchainKHR are hidden, since they are almost the same in all examples.
//! Synchronization between CPU and GPU is done by the frame pool of vkbase, see `vkbase::frame`.
//!

/// This module defines the data structure used in this example.
mod data;
/// This module contains the main logic of the program.
mod example;
/// This module defines some helper functions.
mod helper;

use ash::vk;
use clap::Parser;

use vkbase::context::{VulkanContext, VulkanConfig};
use vkbase::frame::FrameConfig;
use vkbase::utils::time::VkTimeDuration;
use vkbase::{WindowConfig, WindowContext, WindowMode, ProcPipeline};
use vkbase::VkResult;

use std::path::PathBuf;
use std::time::Duration;

const WINDOW_TITLE: &str = "Vulkan Example - Basic indexed triangle";

#[derive(Debug, Parser)]
#[command(name = "triangle", about = "Render an indexed triangle with double-buffered frame pacing.")]
struct Args {

    /// Enable the Khronos validation layer and forward its messages to the log.
    #[arg(long)]
    validation: bool,

    /// Present with FIFO mode instead of the lowest latency mode available.
    #[arg(long)]
    vsync: bool,

    /// Open a borderless fullscreen window.
    #[arg(long)]
    fullscreen: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Number of frames that may be processed concurrently.
    #[arg(long, default_value_t = vkbase::frame::MAX_FRAMES_IN_FLIGHT as u64, value_parser = clap::value_parser!(u64).range(1..=8))]
    frames_in_flight: u64,

    /// Directory containing triangle.vert.spv and triangle.frag.spv.
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/triangle"))]
    shader_dir: PathBuf,

    /// How long to wait for a frame slot to become available, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    fence_timeout_ms: u64,
}

fn main() {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> VkResult<()> {

    let mut win_config = WindowConfig::default();
    win_config.dimension = vk::Extent2D { width: args.width, height: args.height };
    win_config.title = WINDOW_TITLE.to_string();
    if args.fullscreen {
        win_config.mode = WindowMode::Fullscreen;
    }

    let mut vk_config = VulkanConfig::default();
    vk_config.debugger.is_enable = args.validation;
    vk_config.swapchain.present_vsync = args.vsync;
    vk_config.swapchain.dimension_preference = win_config.dimension;

    let fence_timeout = VkTimeDuration::Time(Duration::from_millis(args.fence_timeout_ms));

    let mut frame_config = FrameConfig::new(std::mem::size_of::<data::UboVS>() as _);
    frame_config.frame_in_flight = args.frames_in_flight as usize;
    frame_config.fence_timeout = fence_timeout;

    let window = WindowContext::new(win_config)?;

    let vk_context = VulkanContext::new(&window)
        .with_config(vk_config)
        .build()?;

    // the frame slots are created first, so a failed app setup only has the pipeline to release.
    let entry = ProcPipeline::new(window, vk_context, frame_config)?;

    let app = match example::VulkanExample::new(entry.vulkan(), &args.shader_dir, fence_timeout) {
        | Ok(app) => app,
        | Err(e) => {
            entry.discard();
            return Err(e)
        },
    };

    entry.launch(app)
}

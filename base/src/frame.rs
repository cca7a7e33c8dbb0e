//! Frame pacing: a fixed pool of per-frame resources and the loop that rotates through them.
//!
//! At most `frame_in_flight` frames of GPU work are outstanding at any time. Each slot owns a
//! fence, two semaphores, a command buffer and a mapped uniform region, and the slot is only
//! rewritten after its fence has been observed signaled.

pub use self::backend::{FrameDevice, FramePresenter, FrameSubmission};
pub use self::uniform::UniformRegion;
pub use self::pool::{FramePool, FrameSlot};
pub use self::controller::{FrameLoop, FrameInfo, FrameRecorder};

mod backend;
mod uniform;
mod pool;
mod controller;


use crate::utils::time::VkTimeDuration;
use crate::vkbytes;

/// The number of frames that may be processed concurrently by default.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

#[derive(Debug, Clone)]
pub struct FrameConfig {

    /// the number of frame slots, at least 1.
    pub frame_in_flight: usize,
    /// the size in bytes of the uniform region owned by each slot.
    pub uniform_size: vkbytes,
    /// how long to wait for the fence of a slot before giving up for this tick.
    pub fence_timeout: VkTimeDuration,
}

impl FrameConfig {

    pub fn new(uniform_size: vkbytes) -> FrameConfig {

        FrameConfig {
            frame_in_flight: MAX_FRAMES_IN_FLIGHT,
            uniform_size,
            fence_timeout: VkTimeDuration::default(),
        }
    }
}

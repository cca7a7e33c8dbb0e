
use ash::vk;

use crate::frame::{FrameDevice, FrameConfig, UniformRegion};
use crate::error::{VkResult, VkError};

use std::rc::Rc;

/// The resources dedicated to one frame in flight.
#[derive(Debug)]
pub struct FrameSlot {

    /// signaled when the GPU finishes the last submission recorded in this slot, created signaled.
    pub completion_fence: vk::Fence,
    /// signaled by the presentation engine when the acquired image is ready to be written.
    pub image_acquired: vk::Semaphore,
    /// signaled when rendering of this slot completes, waited by presentation.
    pub render_finished: vk::Semaphore,
    pub command: vk::CommandBuffer,
    pub uniforms: UniformRegion,
}

/// A fixed number of frame slots created once and reused in rotation.
///
/// Dropping the pool waits for the device to become idle before releasing any slot resource.
pub struct FramePool<D: FrameDevice> {

    device: Rc<D>,
    command_pool: vk::CommandPool,
    slots: Vec<FrameSlot>,
}

impl<D: FrameDevice> FramePool<D> {

    pub fn new(device: Rc<D>, config: &FrameConfig) -> VkResult<FramePool<D>> {

        if config.frame_in_flight == 0 {
            return Err(VkError::other("The number of frames in flight must be at least 1."))
        }

        let command_pool = device.create_command_pool()?;

        // from here on the partially built pool releases what has been created if a step fails.
        let mut pool = FramePool {
            device, command_pool,
            slots: Vec::with_capacity(config.frame_in_flight),
        };

        let commands = pool.device.allocate_commands(command_pool, config.frame_in_flight)?;

        for command in commands {
            let slot = pool.create_slot(command, config)?;
            pool.slots.push(slot);
        }

        log::debug!("Created {} frame slots with {} bytes of uniforms each.", pool.slots.len(), config.uniform_size);

        Ok(pool)
    }

    fn create_slot(&self, command: vk::CommandBuffer, config: &FrameConfig) -> VkResult<FrameSlot> {

        let device = &self.device;

        let completion_fence = device.create_fence(true)?;

        let image_acquired = match device.create_semaphore() {
            | Ok(semaphore) => semaphore,
            | Err(e) => {
                device.destroy_fence(completion_fence);
                return Err(e)
            },
        };

        let render_finished = match device.create_semaphore() {
            | Ok(semaphore) => semaphore,
            | Err(e) => {
                device.destroy_semaphore(image_acquired);
                device.destroy_fence(completion_fence);
                return Err(e)
            },
        };

        let uniforms = match device.create_uniform_region(config.uniform_size) {
            | Ok(region) => region,
            | Err(e) => {
                device.destroy_semaphore(render_finished);
                device.destroy_semaphore(image_acquired);
                device.destroy_fence(completion_fence);
                return Err(e)
            },
        };

        let slot = FrameSlot { completion_fence, image_acquired, render_finished, command, uniforms };
        Ok(slot)
    }

    /// Return the slot used by frame `index`, wrapping around the slot count.
    #[inline]
    pub fn get(&self, index: usize) -> &FrameSlot {
        &self.slots[index % self.slots.len()]
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut FrameSlot {
        let count = self.slots.len();
        &mut self.slots[index % count]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameSlot> {
        self.slots.iter()
    }

    #[inline]
    pub fn device(&self) -> &Rc<D> {
        &self.device
    }
}

impl<D: FrameDevice> Drop for FramePool<D> {

    fn drop(&mut self) {

        // an object still referenced by pending work must not be destroyed.
        if let Err(e) = self.device.wait_idle() {
            log::error!("Failed to wait for device idle before releasing frame slots: {}", e);
        }

        for slot in self.slots.drain(..) {
            self.device.destroy_fence(slot.completion_fence);
            self.device.destroy_semaphore(slot.image_acquired);
            self.device.destroy_semaphore(slot.render_finished);
            self.device.destroy_uniform_region(slot.uniforms);
        }

        // command buffers are freed together with their pool.
        self.device.destroy_command_pool(self.command_pool);
    }
}

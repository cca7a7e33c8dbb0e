
use ash::vk;
use ash::vk::Handle;

use vkbase::context::{AcquiredImage, SwapchainSyncError};
use vkbase::frame::{FrameConfig, FrameDevice, FrameInfo, FrameLoop, FramePool, FramePresenter, FrameRecorder, FrameSubmission, UniformRegion};
use vkbase::utils::time::VkTimeDuration;
use vkbase::{FrameAction, VkError, VkErrorKind, VkResult, vkbytes, vkuint};

use nalgebra::{Matrix4, Vector3};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

const UNIFORM_SIZE: vkbytes = 192;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    WaitFence(vk::Fence),
    ResetFence(vk::Fence),
    Begin(vk::CommandBuffer),
    Draw { command: vk::CommandBuffer, image_index: vkuint },
    End(vk::CommandBuffer),
    Submit { command: vk::CommandBuffer, wait: vk::Semaphore, wait_stage: vk::PipelineStageFlags, signal: vk::Semaphore, fence: vk::Fence },
    Acquire(vk::Semaphore),
    Present { wait: vk::Semaphore, image_index: vkuint },
    WaitIdle,
    DestroyFence(vk::Fence),
    DestroySemaphore(vk::Semaphore),
    DestroyCommandPool(vk::CommandPool),
    DestroyUniform(vk::Buffer),
}

#[derive(Default)]
struct CallLog {
    calls: RefCell<Vec<Call>>,
}

impl CallLog {

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }
}

#[derive(Debug, Default)]
struct FenceState {
    signaled: bool,
    /// submitted and not yet observed signaled.
    in_flight: bool,
    /// how many more waits time out before the fence reports signaled.
    pending_waits: u32,
}

#[derive(Default)]
struct DeviceState {
    next_handle: u64,
    fences: HashMap<vk::Fence, FenceState>,
    semaphores: HashSet<vk::Semaphore>,
    command_pools: HashSet<vk::CommandPool>,
    command_owner: HashMap<vk::CommandBuffer, vk::Fence>,
    uniform_regions: usize,
    latencies: VecDeque<u32>,
    semaphore_budget: Option<usize>,
    /// how many of the next submissions are rejected by the queue.
    submit_failures: u32,
    max_in_flight: usize,
}

impl DeviceState {

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn in_flight_count(&self) -> usize {
        self.fences.values().filter(|fence| fence.in_flight).count()
    }
}

/// Simulate a GPU whose submissions complete after a scripted number of timed out waits.
struct MockDevice {
    log: Rc<CallLog>,
    state: RefCell<DeviceState>,
    violations: RefCell<Vec<String>>,
}

impl MockDevice {

    fn new(log: Rc<CallLog>) -> MockDevice {
        MockDevice {
            log,
            state: RefCell::new(DeviceState::default()),
            violations: RefCell::new(Vec::new()),
        }
    }

    fn with_latencies(self, latencies: &[u32]) -> MockDevice {
        self.state.borrow_mut().latencies = latencies.iter().cloned().collect();
        self
    }

    fn with_semaphore_budget(self, budget: usize) -> MockDevice {
        self.state.borrow_mut().semaphore_budget = Some(budget);
        self
    }

    fn with_submit_failures(self, failures: u32) -> MockDevice {
        self.state.borrow_mut().submit_failures = failures;
        self
    }

    fn violate(&self, message: String) {
        self.violations.borrow_mut().push(message);
    }

    fn violations(&self) -> Vec<String> {
        self.violations.borrow().clone()
    }

    fn is_signaled(&self, fence: vk::Fence) -> bool {
        self.state.borrow().fences.get(&fence).map_or(false, |state| state.signaled)
    }

    fn live_objects(&self) -> (usize, usize, usize, usize) {
        let state = self.state.borrow();
        (state.fences.len(), state.semaphores.len(), state.command_pools.len(), state.uniform_regions)
    }

    fn max_in_flight(&self) -> usize {
        self.state.borrow().max_in_flight
    }
}

impl FrameDevice for MockDevice {

    fn create_fence(&self, is_signaled: bool) -> VkResult<vk::Fence> {
        let mut state = self.state.borrow_mut();
        let fence = vk::Fence::from_raw(state.next_handle());
        state.fences.insert(fence, FenceState { signaled: is_signaled, ..Default::default() });
        Ok(fence)
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        self.log.push(Call::DestroyFence(fence));
        match self.state.borrow_mut().fences.remove(&fence) {
            | Some(state) if state.in_flight => self.violate(format!("{:?} destroyed while in flight", fence)),
            | Some(_) => {},
            | None => self.violate(format!("{:?} destroyed twice", fence)),
        }
    }

    fn create_semaphore(&self) -> VkResult<vk::Semaphore> {
        let mut state = self.state.borrow_mut();
        let budget = state.semaphore_budget;
        match budget {
            | Some(0) => return Err(VkError::api("Semaphore Creation", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)),
            | Some(budget) => state.semaphore_budget = Some(budget - 1),
            | None => {},
        }
        let semaphore = vk::Semaphore::from_raw(state.next_handle());
        state.semaphores.insert(semaphore);
        Ok(semaphore)
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.log.push(Call::DestroySemaphore(semaphore));
        if !self.state.borrow_mut().semaphores.remove(&semaphore) {
            self.violate(format!("{:?} destroyed twice", semaphore));
        }
    }

    fn create_command_pool(&self) -> VkResult<vk::CommandPool> {
        let mut state = self.state.borrow_mut();
        let pool = vk::CommandPool::from_raw(state.next_handle());
        state.command_pools.insert(pool);
        Ok(pool)
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.log.push(Call::DestroyCommandPool(pool));
        if !self.state.borrow_mut().command_pools.remove(&pool) {
            self.violate(format!("{:?} destroyed twice", pool));
        }
    }

    fn allocate_commands(&self, _pool: vk::CommandPool, count: usize) -> VkResult<Vec<vk::CommandBuffer>> {
        let mut state = self.state.borrow_mut();
        let commands = (0..count)
            .map(|_| vk::CommandBuffer::from_raw(state.next_handle()))
            .collect();
        Ok(commands)
    }

    fn create_uniform_region(&self, size: vkbytes) -> VkResult<UniformRegion> {
        let mut state = self.state.borrow_mut();
        let buffer = vk::Buffer::from_raw(state.next_handle());
        let memory = vk::DeviceMemory::from_raw(state.next_handle());

        let storage = vec![0_u8; size as usize].into_boxed_slice();
        let mapped = Box::into_raw(storage) as *mut u8;

        state.uniform_regions += 1;
        unsafe { UniformRegion::from_raw_parts(buffer, memory, mapped, size as usize) }
    }

    fn destroy_uniform_region(&self, mut region: UniformRegion) {
        self.log.push(Call::DestroyUniform(region.buffer()));
        self.state.borrow_mut().uniform_regions -= 1;
        unsafe {
            drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(region.as_mut_ptr(), region.size())));
        }
    }

    fn wait_fence(&self, fence: vk::Fence, _timeout: VkTimeDuration) -> VkResult<()> {
        self.log.push(Call::WaitFence(fence));

        let mut state = self.state.borrow_mut();
        let fence_state = state.fences.get_mut(&fence)
            .ok_or_else(|| VkError::other("unknown fence"))?;

        if fence_state.signaled {
            Ok(())
        } else if !fence_state.in_flight {
            drop(state);
            self.violate(format!("{:?} waited without any pending submission", fence));
            Err(VkError::timeout("Fence Waiting"))
        } else if fence_state.pending_waits > 0 {
            fence_state.pending_waits -= 1;
            Err(VkError::timeout("Fence Waiting"))
        } else {
            fence_state.signaled = true;
            fence_state.in_flight = false;
            Ok(())
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> VkResult<()> {
        self.log.push(Call::ResetFence(fence));

        let mut state = self.state.borrow_mut();
        let fence_state = state.fences.get_mut(&fence)
            .ok_or_else(|| VkError::other("unknown fence"))?;

        let was_signaled = fence_state.signaled;
        fence_state.signaled = false;
        drop(state);

        if !was_signaled {
            self.violate(format!("{:?} reset before it was observed signaled", fence));
        }
        Ok(())
    }

    fn begin_commands(&self, command: vk::CommandBuffer) -> VkResult<()> {
        self.log.push(Call::Begin(command));

        let state = self.state.borrow();
        let is_in_flight = state.command_owner.get(&command)
            .and_then(|fence| state.fences.get(fence))
            .map_or(false, |fence| fence.in_flight);
        drop(state);

        if is_in_flight {
            self.violate(format!("{:?} re-recorded while in flight", command));
        }
        Ok(())
    }

    fn end_commands(&self, command: vk::CommandBuffer) -> VkResult<()> {
        self.log.push(Call::End(command));
        Ok(())
    }

    fn submit(&self, submission: &FrameSubmission) -> VkResult<()> {
        self.log.push(Call::Submit {
            command: submission.command,
            wait: submission.wait_semaphore,
            wait_stage: submission.wait_stage,
            signal: submission.signal_semaphore,
            fence: submission.fence,
        });

        let mut violations = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            if state.submit_failures > 0 {
                state.submit_failures -= 1;
                return Err(VkError::api("Queue Submit", vk::Result::ERROR_OUT_OF_HOST_MEMORY))
            }
            let latency = state.latencies.pop_front().unwrap_or(0);

            let fence_state = state.fences.get_mut(&submission.fence)
                .ok_or_else(|| VkError::other("unknown fence"))?;
            if fence_state.signaled || fence_state.in_flight {
                violations.push(format!("{:?} submitted without being reset", submission.fence));
            }
            fence_state.in_flight = true;
            fence_state.pending_waits = latency;

            state.command_owner.insert(submission.command, submission.fence);
            let in_flight = state.in_flight_count();
            state.max_in_flight = state.max_in_flight.max(in_flight);
        }

        for violation in violations {
            self.violate(violation);
        }
        Ok(())
    }

    fn wait_idle(&self) -> VkResult<()> {
        self.log.push(Call::WaitIdle);
        for fence in self.state.borrow_mut().fences.values_mut() {
            if fence.in_flight {
                fence.in_flight = false;
                fence.signaled = true;
            }
        }
        Ok(())
    }
}

struct MockPresenter {
    log: Rc<CallLog>,
    image_count: vkuint,
    next_image: RefCell<vkuint>,
    acquire_script: RefCell<VecDeque<Result<AcquiredImage, SwapchainSyncError>>>,
    present_script: RefCell<VecDeque<Result<bool, SwapchainSyncError>>>,
}

impl MockPresenter {

    fn new(log: Rc<CallLog>) -> MockPresenter {
        MockPresenter {
            log,
            image_count: 3,
            next_image: RefCell::new(0),
            acquire_script: RefCell::new(VecDeque::new()),
            present_script: RefCell::new(VecDeque::new()),
        }
    }

    fn script_acquire(&self, result: Result<AcquiredImage, SwapchainSyncError>) {
        self.acquire_script.borrow_mut().push_back(result);
    }

    fn script_present(&self, result: Result<bool, SwapchainSyncError>) {
        self.present_script.borrow_mut().push_back(result);
    }
}

impl FramePresenter for MockPresenter {

    fn acquire_image(&self, signal: vk::Semaphore) -> Result<AcquiredImage, SwapchainSyncError> {
        self.log.push(Call::Acquire(signal));

        if let Some(scripted) = self.acquire_script.borrow_mut().pop_front() {
            return scripted
        }

        let mut next_image = self.next_image.borrow_mut();
        let index = *next_image;
        *next_image = (index + 1) % self.image_count;
        Ok(AcquiredImage { index, is_suboptimal: false })
    }

    fn present_image(&self, wait: vk::Semaphore, image_index: vkuint) -> Result<bool, SwapchainSyncError> {
        self.log.push(Call::Present { wait, image_index });
        self.present_script.borrow_mut().pop_front().unwrap_or(Ok(false))
    }

    fn dimension(&self) -> vk::Extent2D {
        vk::Extent2D { width: 800, height: 600 }
    }
}

/// Projection, model and view matrices, laid out as the vertex shader reads them.
type Transforms = [Matrix4<f32>; 3];

fn known_transforms() -> Transforms {
    [
        Matrix4::new_perspective(800.0 / 600.0, 60.0_f32.to_radians(), 1.0, 256.0),
        Matrix4::identity(),
        Matrix4::new_translation(&Vector3::new(0.0, 0.0, -2.5)),
    ]
}

struct TestRecorder {
    device: Rc<MockDevice>,
    slot_fences: Vec<vk::Fence>,
    transforms: Transforms,
    updated_frames: Vec<usize>,
    read_back_matches: Vec<bool>,
}

impl TestRecorder {

    fn new(device: &Rc<MockDevice>, frames: &FramePool<MockDevice>) -> TestRecorder {
        TestRecorder {
            device: Rc::clone(device),
            slot_fences: frames.iter().map(|slot| slot.completion_fence).collect(),
            transforms: known_transforms(),
            updated_frames: Vec::new(),
            read_back_matches: Vec::new(),
        }
    }
}

impl FrameRecorder<MockDevice> for TestRecorder {

    fn update_uniforms(&mut self, frame: &FrameInfo, uniforms: &mut UniformRegion) -> VkResult<()> {

        let fence = self.slot_fences[frame.frame_index];
        if !self.device.is_signaled(fence) {
            self.device.violate(format!("uniforms of frame {} written while in flight", frame.frame_index));
        }

        uniforms.write(&self.transforms)?;

        let expected = bytemuck::bytes_of(&self.transforms);
        self.read_back_matches.push(&uniforms.as_bytes()[..expected.len()] == expected);
        self.updated_frames.push(frame.frame_index);
        Ok(())
    }

    fn record_commands(&mut self, device: &MockDevice, frame: &FrameInfo, command: vk::CommandBuffer) -> VkResult<()> {
        device.log.push(Call::Draw { command, image_index: frame.image_index });
        Ok(())
    }
}

struct Harness {
    log: Rc<CallLog>,
    device: Rc<MockDevice>,
    presenter: MockPresenter,
    frames: FrameLoop<MockDevice>,
    recorder: TestRecorder,
}

impl Harness {

    fn new(device: MockDevice, log: Rc<CallLog>, frame_in_flight: usize) -> Harness {

        let device = Rc::new(device);
        let frames = FrameLoop::new(Rc::clone(&device), &frame_config(frame_in_flight))
            .expect("frame loop creation");
        let recorder = TestRecorder::new(&device, frames.frames());
        let presenter = MockPresenter::new(Rc::clone(&log));
        log.take();

        Harness { log, device, presenter, frames, recorder }
    }

    fn with_frames(frame_in_flight: usize) -> Harness {
        let log = Rc::new(CallLog::default());
        Harness::new(MockDevice::new(Rc::clone(&log)), log, frame_in_flight)
    }

    fn with_latencies(frame_in_flight: usize, latencies: &[u32]) -> Harness {
        let log = Rc::new(CallLog::default());
        Harness::new(MockDevice::new(Rc::clone(&log)).with_latencies(latencies), log, frame_in_flight)
    }

    fn render(&mut self) -> VkResult<FrameAction> {
        self.frames.render_frame(&self.presenter, &mut self.recorder, 0.016)
    }

    /// Render until a frame completes, retrying the recoverable timeouts, and return the number of retries.
    fn render_until_complete(&mut self) -> usize {

        let mut retries = 0;
        loop {
            match self.render() {
                | Ok(FrameAction::Rendering) => return retries,
                | Ok(action) => panic!("unexpected action {:?}", action),
                | Err(ref e) if e.is_recoverable() => retries += 1,
                | Err(e) => panic!("unexpected error: {}", e),
            }
        }
    }
}

fn frame_config(frame_in_flight: usize) -> FrameConfig {
    FrameConfig {
        frame_in_flight,
        uniform_size: UNIFORM_SIZE,
        fence_timeout: VkTimeDuration::Time(Duration::from_millis(5)),
    }
}

fn count_calls(calls: &[Call], predicate: impl Fn(&Call) -> bool) -> usize {
    calls.iter().filter(|call| predicate(call)).count()
}

#[test]
fn pool_creates_signaled_fences_and_distinct_slots() {

    let log = Rc::new(CallLog::default());
    let device = Rc::new(MockDevice::new(Rc::clone(&log)));
    let pool = FramePool::new(Rc::clone(&device), &frame_config(3)).unwrap();

    assert_eq!(pool.len(), 3);
    assert_eq!(device.live_objects(), (3, 6, 1, 3));
    assert!(pool.iter().all(|slot| device.is_signaled(slot.completion_fence)));
    assert!(pool.iter().all(|slot| slot.uniforms.size() == UNIFORM_SIZE as usize));

    let fences: HashSet<vk::Fence> = pool.iter().map(|slot| slot.completion_fence).collect();
    let commands: HashSet<vk::CommandBuffer> = pool.iter().map(|slot| slot.command).collect();
    assert_eq!(fences.len(), 3);
    assert_eq!(commands.len(), 3);
}

#[test]
fn pool_lookup_wraps_around() {

    let log = Rc::new(CallLog::default());
    let device = Rc::new(MockDevice::new(log));
    let pool = FramePool::new(device, &frame_config(2)).unwrap();

    for index in 0..7 {
        assert_eq!(pool.get(index).completion_fence, pool.get(index % 2).completion_fence);
        assert_eq!(pool.get(index).command, pool.get(index % 2).command);
    }
}

#[test]
fn pool_rejects_zero_frames() {

    let log = Rc::new(CallLog::default());
    let device = Rc::new(MockDevice::new(log));

    assert!(FramePool::new(Rc::clone(&device), &frame_config(0)).is_err());
    assert_eq!(device.live_objects(), (0, 0, 0, 0));
}

#[test]
fn failed_pool_creation_releases_created_objects() {

    let log = Rc::new(CallLog::default());
    let device = Rc::new(MockDevice::new(log).with_semaphore_budget(3));

    let result = FramePool::new(Rc::clone(&device), &frame_config(2));

    match result {
        | Err(e) => assert!(!e.is_recoverable()),
        | Ok(_) => panic!("pool creation should fail when semaphores run out"),
    }
    assert_eq!(device.live_objects(), (0, 0, 0, 0));
    assert!(device.violations().is_empty());
}

#[test]
fn dropping_pool_waits_idle_before_releasing() {

    let mut harness = Harness::with_latencies(2, &[5, 5]);
    harness.render_until_complete();
    harness.render_until_complete();
    harness.log.take();

    let Harness { log, device, frames, recorder, .. } = harness;
    drop(recorder);
    drop(frames);

    let calls = log.take();
    assert_eq!(calls.first(), Some(&Call::WaitIdle));
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::DestroyFence(_))), 2);
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::DestroySemaphore(_))), 4);
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::DestroyUniform(_))), 2);
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::DestroyCommandPool(_))), 1);
    assert_eq!(device.live_objects(), (0, 0, 0, 0));
    assert!(device.violations().is_empty(), "{:?}", device.violations());
}

#[test]
fn frame_index_is_iterations_modulo_frame_count() {

    for frame_in_flight in 1..=4 {

        let mut harness = Harness::with_frames(frame_in_flight);

        for completed in 0..10 {
            assert_eq!(harness.frames.frame_index(), completed % frame_in_flight);
            assert_eq!(harness.render().unwrap(), FrameAction::Rendering);
        }
        assert_eq!(harness.frames.frame_index(), 10 % frame_in_flight);
    }
}

#[test]
fn successful_frame_submits_once_then_presents_same_image() {

    let mut harness = Harness::with_frames(2);

    for _ in 0..4 {

        let frame_index = harness.frames.frame_index();
        let slot_fence = harness.frames.frames().get(frame_index).completion_fence;
        let image_acquired = harness.frames.frames().get(frame_index).image_acquired;
        let render_finished = harness.frames.frames().get(frame_index).render_finished;
        let command = harness.frames.frames().get(frame_index).command;

        assert_eq!(harness.render().unwrap(), FrameAction::Rendering);

        let calls = harness.log.take();
        let acquired_index = match calls.iter().find_map(|call| match call { Call::Draw { image_index, .. } => Some(*image_index), _ => None }) {
            | Some(index) => index,
            | None => panic!("no draw recorded"),
        };

        assert_eq!(calls, vec![
            Call::WaitFence(slot_fence),
            Call::Acquire(image_acquired),
            Call::Begin(command),
            Call::Draw { command, image_index: acquired_index },
            Call::End(command),
            Call::ResetFence(slot_fence),
            Call::Submit {
                command,
                wait: image_acquired,
                wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                signal: render_finished,
                fence: slot_fence,
            },
            Call::Present { wait: render_finished, image_index: acquired_index },
        ]);
    }

    assert!(harness.device.violations().is_empty(), "{:?}", harness.device.violations());
}

#[test]
fn stale_surface_on_acquire_aborts_without_submitting() {

    let mut harness = Harness::with_frames(2);
    harness.presenter.script_acquire(Err(SwapchainSyncError::SurfaceOutDate));

    assert_eq!(harness.render().unwrap(), FrameAction::SwapchainRecreate);

    let calls = harness.log.take();
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::Submit { .. })), 0);
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::Present { .. })), 0);
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::ResetFence(_))), 0);
    assert_eq!(harness.frames.frame_index(), 0);
    assert!(harness.recorder.updated_frames.is_empty());

    // the untouched fence lets the retry on the same slot proceed at once.
    assert_eq!(harness.render_until_complete(), 0);
    assert_eq!(harness.recorder.updated_frames, vec![0]);
    assert!(harness.device.violations().is_empty(), "{:?}", harness.device.violations());
}

#[test]
fn other_acquire_failures_are_fatal_with_status() {

    let mut harness = Harness::with_frames(2);
    harness.presenter.script_acquire(Err(SwapchainSyncError::Unknown(vk::Result::ERROR_DEVICE_LOST)));

    let error = harness.render().unwrap_err();
    assert!(!error.is_recoverable());
    match error.kind() {
        | VkErrorKind::Api { ops, result } => {
            assert_eq!(*ops, "Acquire Next Image");
            assert_eq!(*result, vk::Result::ERROR_DEVICE_LOST);
        },
        | kind => panic!("unexpected error kind: {:?}", kind),
    }

    let calls = harness.log.take();
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::Submit { .. })), 0);
    assert_eq!(harness.frames.frame_index(), 0);
}

#[test]
fn suboptimal_acquire_renders_then_requests_rebuild() {

    let mut harness = Harness::with_frames(2);
    harness.presenter.script_acquire(Ok(AcquiredImage { index: 2, is_suboptimal: true }));

    assert_eq!(harness.render().unwrap(), FrameAction::SwapchainRecreate);

    let calls = harness.log.take();
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::Submit { .. })), 1);
    assert_eq!(count_calls(&calls, |call| matches!(call, Call::Present { image_index: 2, .. })), 1);
    assert_eq!(harness.frames.frame_index(), 1);
}

#[test]
fn stale_or_suboptimal_present_requests_rebuild() {

    let mut harness = Harness::with_frames(2);
    harness.presenter.script_present(Ok(true));
    harness.presenter.script_present(Err(SwapchainSyncError::SurfaceOutDate));

    assert_eq!(harness.render().unwrap(), FrameAction::SwapchainRecreate);
    assert_eq!(harness.render().unwrap(), FrameAction::SwapchainRecreate);
    assert_eq!(harness.render().unwrap(), FrameAction::Rendering);

    assert_eq!(harness.frames.frame_index(), 1);
    assert!(harness.device.violations().is_empty(), "{:?}", harness.device.violations());
}

#[test]
fn other_present_failures_are_fatal() {

    let mut harness = Harness::with_frames(2);
    harness.presenter.script_present(Err(SwapchainSyncError::Unknown(vk::Result::ERROR_SURFACE_LOST_KHR)));

    let error = harness.render().unwrap_err();
    match error.kind() {
        | VkErrorKind::Api { ops, result } => {
            assert_eq!(*ops, "Queue Present");
            assert_eq!(*result, vk::Result::ERROR_SURFACE_LOST_KHR);
        },
        | kind => panic!("unexpected error kind: {:?}", kind),
    }

    // the work was submitted, so the slot is not reused for the next frame.
    assert_eq!(harness.frames.frame_index(), 1);
}

#[test]
fn fence_timeout_is_recoverable_and_keeps_frame_index() {

    let mut harness = Harness::with_latencies(2, &[2]);
    harness.render_until_complete();
    harness.render_until_complete();
    harness.log.take();

    let slot_fence = harness.frames.frames().get(0).completion_fence;

    for _ in 0..2 {
        let error = harness.render().unwrap_err();
        assert!(error.is_recoverable());
        assert_eq!(harness.frames.frame_index(), 0);
        assert_eq!(harness.log.take(), vec![Call::WaitFence(slot_fence)]);
    }

    assert_eq!(harness.render().unwrap(), FrameAction::Rendering);
    assert_eq!(harness.frames.frame_index(), 1);
    assert!(harness.device.violations().is_empty(), "{:?}", harness.device.violations());
}

#[test]
fn uniform_write_reads_back_before_submission() {

    let mut harness = Harness::with_frames(2);
    harness.render_until_complete();

    let expected = bytemuck::bytes_of(&known_transforms()).to_vec();
    let region = &harness.frames.frames().get(0).uniforms;

    assert_eq!(harness.recorder.read_back_matches, vec![true]);
    assert_eq!(&region.as_bytes()[..expected.len()], expected.as_slice());
    assert_eq!(region.descriptor().range, UNIFORM_SIZE);
}

#[test]
fn double_buffering_with_alternating_fence_latencies() {

    let mut harness = Harness::with_latencies(2, &[0, 1, 0, 1, 0]);

    let mut frame_indices = Vec::new();
    let mut retries = 0;

    for _ in 0..5 {
        frame_indices.push(harness.frames.frame_index());
        retries += harness.render_until_complete();
    }

    assert_eq!(frame_indices, vec![0, 1, 0, 1, 0]);
    assert_eq!(harness.recorder.updated_frames, vec![0, 1, 0, 1, 0]);
    // only the second submission is waited on again within five frames.
    assert_eq!(retries, 1);
    assert!(harness.device.max_in_flight() <= 2);
    assert!(harness.device.violations().is_empty(), "{:?}", harness.device.violations());
}

#[test]
fn slots_are_never_reused_before_their_fence_signals() {

    for frame_in_flight in 1..=4 {

        let latencies: Vec<u32> = (0..24).map(|i| i % 3).collect();
        let mut harness = Harness::with_latencies(frame_in_flight, &latencies);

        for completed in 0..24 {
            assert_eq!(harness.frames.frame_index(), completed % frame_in_flight);
            harness.render_until_complete();
        }

        assert!(harness.device.max_in_flight() <= frame_in_flight);
        assert!(harness.device.violations().is_empty(), "{:?}", harness.device.violations());
    }
}

#[test]
fn failed_submit_leaves_slot_usable() {

    let log = Rc::new(CallLog::default());
    let mut harness = Harness::new(MockDevice::new(Rc::clone(&log)).with_submit_failures(1), log, 2);
    let old_fence = harness.frames.frames().get(0).completion_fence;

    let error = harness.render().unwrap_err();
    assert!(!error.is_recoverable());
    match error.kind() {
        | VkErrorKind::Api { ops, result } => {
            assert_eq!(*ops, "Queue Submit");
            assert_eq!(*result, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        },
        | kind => panic!("unexpected error kind: {:?}", kind),
    }
    assert_eq!(harness.frames.frame_index(), 0);

    // the unsignaled fence is replaced by a signaled one, the old one is released.
    let new_fence = harness.frames.frames().get(0).completion_fence;
    assert_ne!(new_fence, old_fence);
    assert!(harness.device.is_signaled(new_fence));
    assert!(harness.log.take().contains(&Call::DestroyFence(old_fence)));
    assert_eq!(harness.device.live_objects().0, 2);

    harness.recorder.slot_fences = harness.frames.frames().iter().map(|slot| slot.completion_fence).collect();

    // the retry on the same slot does not wait on a fence nothing will signal.
    assert_eq!(harness.render().unwrap(), FrameAction::Rendering);
    assert_eq!(harness.frames.frame_index(), 1);
    for _ in 0..3 {
        assert_eq!(harness.render_until_complete(), 0);
    }
    assert!(harness.device.violations().is_empty(), "{:?}", harness.device.violations());
}

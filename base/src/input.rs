
use smallvec::SmallVec;
use winit::event::{Event, WindowEvent, ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::utils::frame::FrameAction;
use crate::utils::fps::FpsCounter;

const SIMULTANEOUS_KEY_COUNT: usize = 12;


/// Collect window events between two frames.
pub struct EventController {

    pub key: KeyHeap,
    pub fps_counter: FpsCounter,

    action: FrameAction,
    is_toggle_key: bool,
}

impl Default for EventController {

    fn default() -> EventController {

        EventController {
            key: Default::default(),
            fps_counter: FpsCounter::new(),

            action: FrameAction::Rendering,
            is_toggle_key: false,
        }
    }
}

impl EventController {

    pub(crate) fn record_event(&mut self, event: &Event<()>) {

        if let Event::WindowEvent { event, .. } = event {
            match event {
                | WindowEvent::KeyboardInput { event: KeyEvent { physical_key, state, .. }, .. } => {
                    if let PhysicalKey::Code(code) = physical_key {
                        match state {
                            | ElementState::Pressed => {
                                self.key.key_press(*code);
                                self.is_toggle_key = true;
                            },
                            | ElementState::Released => {
                                self.key.key_release(*code);
                            },
                        }
                    }
                },
                | WindowEvent::Resized(_) => {
                    self.request_action(FrameAction::SwapchainRecreate);
                },
                | WindowEvent::CloseRequested => {
                    self.request_action(FrameAction::Terminal);
                },
                | _ => (),
            }
        }
    }

    /// Keep the most severe action requested since last frame.
    fn request_action(&mut self, action: FrameAction) {

        self.action = match (self.action, action) {
            | (FrameAction::Terminal, _) | (_, FrameAction::Terminal) => FrameAction::Terminal,
            | (FrameAction::SwapchainRecreate, _) | (_, FrameAction::SwapchainRecreate) => FrameAction::SwapchainRecreate,
            | _ => FrameAction::Rendering,
        };
    }

    pub fn is_key_active(&self) -> bool {
        self.is_toggle_key
    }

    pub(crate) fn tick_frame(&mut self) {

        self.fps_counter.tick_frame();
        self.is_toggle_key = false;
        self.action = FrameAction::Rendering;
    }

    pub(crate) fn current_action(&self) -> FrameAction {
        self.action
    }
}


/// The keys currently held down.
pub struct KeyHeap {

    keys: SmallVec<[KeyCode; SIMULTANEOUS_KEY_COUNT]>,
}

impl Default for KeyHeap {

    fn default() -> KeyHeap {
        KeyHeap { keys: SmallVec::new(), }
    }
}

impl KeyHeap {

    fn key_press(&mut self, code: KeyCode) {

        // if input key has been existed, just ignore it.
        if self.is_key_pressed(code) {
            return
        }

        // and the key pool has been full, just ignore the input key.
        if self.keys.len() < SIMULTANEOUS_KEY_COUNT {
            self.keys.push(code);
        }
    }

    fn key_release(&mut self, code: KeyCode) {

        if let Some(index) = self.keys.iter().position(|&key_code| key_code == code) {
            self.keys.swap_remove(index);
        }
    }

    pub fn is_key_pressed(&self, code: KeyCode) -> bool {
        self.keys.iter().any(|&key_code| key_code == code)
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use winit::dpi::PhysicalSize;
    use winit::window::WindowId;

    fn window_event(event: WindowEvent) -> Event<()> {
        Event::WindowEvent {
            window_id: unsafe { WindowId::dummy() },
            event,
        }
    }

    #[test]
    fn key_heap_tracks_held_keys() {

        let mut heap = KeyHeap::default();

        heap.key_press(KeyCode::Escape);
        heap.key_press(KeyCode::Escape);
        heap.key_press(KeyCode::KeyW);
        assert!(heap.is_key_pressed(KeyCode::Escape));
        assert!(heap.is_key_pressed(KeyCode::KeyW));
        assert_eq!(heap.keys.len(), 2);

        heap.key_release(KeyCode::Escape);
        assert!(!heap.is_key_pressed(KeyCode::Escape));
        assert!(heap.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn key_heap_ignores_keys_beyond_capacity() {

        let codes = [
            KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE, KeyCode::KeyF, KeyCode::KeyG,
            KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ, KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM,
        ];

        let mut heap = KeyHeap::default();
        for &code in codes.iter() {
            heap.key_press(code);
        }

        assert_eq!(heap.keys.len(), SIMULTANEOUS_KEY_COUNT);
        assert!(!heap.is_key_pressed(KeyCode::KeyM));
    }

    #[test]
    fn window_events_request_actions() {

        let mut controller = EventController::default();
        assert_eq!(controller.current_action(), FrameAction::Rendering);

        controller.record_event(&window_event(WindowEvent::Resized(PhysicalSize::new(640, 480))));
        assert_eq!(controller.current_action(), FrameAction::SwapchainRecreate);

        controller.record_event(&window_event(WindowEvent::CloseRequested));
        controller.record_event(&window_event(WindowEvent::Resized(PhysicalSize::new(800, 600))));
        assert_eq!(controller.current_action(), FrameAction::Terminal);

        controller.tick_frame();
        assert_eq!(controller.current_action(), FrameAction::Rendering);
    }
}

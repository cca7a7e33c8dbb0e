
/// Select the frame slot in use, rotating through `frame_in_flight` slots.
#[derive(Debug, Clone)]
pub struct FrameCounter {

    frame_in_flight: usize,
    current: usize,
}

/// What the main loop should do after an event or a rendered frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FrameAction {
    Rendering,
    SwapchainRecreate,
    Terminal,
}

impl FrameCounter {

    pub fn new(frame_in_flight: usize) -> FrameCounter {

        debug_assert!(frame_in_flight > 0, "At least one frame must be in flight.");

        FrameCounter {
            frame_in_flight,
            current: 0,
        }
    }

    #[inline]
    pub fn frame_in_flight(&self) -> usize {
        self.frame_in_flight
    }

    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn next_frame(&mut self) {
        self.current = (self.current + 1) % self.frame_in_flight;
    }
}


#[cfg(test)]
mod tests {

    use super::FrameCounter;

    #[test]
    fn counter_is_modular() {

        for frame_in_flight in 1..=4 {

            let mut counter = FrameCounter::new(frame_in_flight);

            for completed in 0..13 {
                assert_eq!(counter.current_frame(), completed % frame_in_flight);
                counter.next_frame();
            }
        }
    }
}

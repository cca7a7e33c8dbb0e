
use std::time::{Duration, Instant};

pub const FPS_SAMPLE_COUNT: usize = 5;

/// Track the time between loop ticks and average it over a few samples.
pub struct FpsCounter {

    counter: Instant,

    samples: [Duration; FPS_SAMPLE_COUNT],
    current_sample: usize,
    delta_frame: Duration,
}

impl FpsCounter {

    pub fn new() -> FpsCounter {

        FpsCounter {
            counter: Instant::now(),
            samples: [Duration::ZERO; FPS_SAMPLE_COUNT],
            current_sample: 0,
            delta_frame: Duration::ZERO,
        }
    }

    /// Call this function in game loop to update its inner status.
    pub fn tick_frame(&mut self) {

        let now = Instant::now();
        self.record(now - self.counter);
        self.counter = now;
    }

    fn record(&mut self, elapsed: Duration) {

        self.delta_frame = elapsed;
        self.samples[self.current_sample] = elapsed;
        self.current_sample = (self.current_sample + 1) % FPS_SAMPLE_COUNT;
    }

    /// Calculate the current FPS, or 0 if no frame has been sampled yet.
    pub fn fps(&self) -> f32 {

        let total: Duration = self.samples.iter().sum();
        if total.is_zero() {
            0.0
        } else {
            FPS_SAMPLE_COUNT as f32 / total.as_secs_f32()
        }
    }

    /// Return the duration of last frame in seconds.
    pub fn delta_time(&self) -> f32 {
        self.delta_frame.as_secs_f32()
    }
}

impl Default for FpsCounter {

    fn default() -> FpsCounter {
        FpsCounter::new()
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn averages_the_recent_samples() {

        let mut counter = FpsCounter::new();
        assert_eq!(counter.fps(), 0.0);

        for _ in 0..FPS_SAMPLE_COUNT {
            counter.record(Duration::from_millis(20));
        }

        approx::assert_relative_eq!(counter.fps(), 50.0, epsilon = 1e-3);
        approx::assert_relative_eq!(counter.delta_time(), 0.02, epsilon = 1e-6);
    }
}

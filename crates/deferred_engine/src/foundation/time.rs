//! Time management utilities

use std::time::Instant;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

/// Fixed-timestep accumulator.
///
/// Real frame time is fed in with [`FixedTimestep::advance`]; the returned
/// count is the number of simulation ticks to run this frame, and
/// [`FixedTimestep::alpha`] is the leftover fraction used to interpolate the
/// render between the last two tick states.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
    max_ticks: u32,
}

impl FixedTimestep {
    /// Create an accumulator running at `ticks_per_second`, clamping a frame to
    /// at most `max_ticks` ticks (spiral-of-death guard).
    pub fn new(ticks_per_second: u32, max_ticks: u32) -> Self {
        Self {
            step: 1.0 / ticks_per_second.max(1) as f32,
            accumulator: 0.0,
            max_ticks: max_ticks.max(1),
        }
    }

    /// Length of one tick in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add frame time and return how many ticks are due
    pub fn advance(&mut self, frame_time: f32) -> u32 {
        self.accumulator += frame_time.max(0.0);
        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_ticks {
            self.accumulator -= self.step;
            ticks += 1;
        }
        if ticks == self.max_ticks && self.accumulator >= self.step {
            log::warn!(
                "Dropping {:.3}s of simulation time after {} ticks",
                self.accumulator,
                ticks
            );
            self.accumulator %= self.step;
        }
        ticks
    }

    /// Interpolation factor between the previous and current tick, in `[0, 1)`
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_timestep_ticks_and_alpha() {
        let mut stepper = FixedTimestep::new(10, 8);

        assert_eq!(stepper.advance(0.25), 2);
        assert_relative_eq!(stepper.alpha(), 0.5, epsilon = 1e-4);

        assert_eq!(stepper.advance(0.06), 1);
        assert_relative_eq!(stepper.alpha(), 0.1, epsilon = 1e-3);
    }

    #[test]
    fn test_fixed_timestep_clamps_long_frames() {
        let mut stepper = FixedTimestep::new(60, 4);
        assert_eq!(stepper.advance(1.0), 4);
        assert!(stepper.alpha() < 1.0);
    }
}

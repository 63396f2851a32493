#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Measures the wall-clock time between consecutive ticks.
pub struct Timer {
    last_tick: Instant,
    delta: Duration,
    ticks: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta: Duration::ZERO,
            ticks: 0,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.ticks += 1;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Longest step handed to the mixer; a hidden tab resumes without a jump.
const MAX_FRAME_DELTA: f32 = 0.25;

/// Per-display-refresh driver.
///
/// Produces the elapsed time for each frame until cancelled. After
/// [`FrameLoop::cancel`] no further frames are produced.
pub struct FrameLoop {
    timer: Timer,
    running: bool,
}

impl FrameLoop {
    #[must_use]
    pub fn start() -> Self {
        Self {
            timer: Timer::new(),
            running: true,
        }
    }

    /// Seconds since the previous frame, or `None` once cancelled.
    pub fn tick(&mut self) -> Option<f32> {
        if !self.running {
            return None;
        }
        self.timer.tick();
        Some(self.timer.dt_seconds().min(MAX_FRAME_DELTA))
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.timer.ticks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_loop_produces_no_frames() {
        let mut frames = FrameLoop::start();
        assert!(frames.tick().is_some());
        frames.cancel();
        assert_eq!(frames.tick(), None);
        assert_eq!(frames.frame_count(), 1);
    }

    #[test]
    fn frame_delta_is_clamped() {
        let mut frames = FrameLoop::start();
        let dt = frames.tick().unwrap();
        assert!((0.0..=MAX_FRAME_DELTA).contains(&dt));
    }
}

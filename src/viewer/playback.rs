use serde::Serialize;

use crate::errors::{Result, ViewerError};

/// Transport state shared by the UI and the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    speed: f32,
    pub paused: bool,
}

impl PlaybackState {
    /// An invalid `speed` falls back to `1.0`.
    #[must_use]
    pub fn new(speed: f32) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        Self {
            speed,
            paused: false,
        }
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Accepts any finite, strictly positive value.
    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ViewerError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Flips `paused` and returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_and_non_finite_speeds() {
        let mut state = PlaybackState::default();
        assert_eq!(state.set_speed(0.0), Err(ViewerError::InvalidSpeed(0.0)));
        assert!(state.set_speed(-1.0).is_err());
        assert!(state.set_speed(f32::NAN).is_err());
        assert!(state.set_speed(f32::INFINITY).is_err());
        assert!((state.speed() - 1.0).abs() < f32::EPSILON);

        state.set_speed(1.5).unwrap();
        assert!((state.speed() - 1.5).abs() < f32::EPSILON);
    }
}

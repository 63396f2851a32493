use std::sync::Arc;

use crate::animation::{
    binding::PropertyBinding,
    clip::{AnimationClip, TrackData},
    tracks::KeyframeCursor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Loop,
    PingPong,
}

/// Playback state of one clip inside a mixer.
///
/// `time` only advances while the action is `running` and not `paused`;
/// pausing and resuming never moves the clip time.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,

    pub time: f32,
    pub time_scale: f32,
    pub weight: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
    pub enabled: bool,
    /// Completed loops (or ping-pong reversals) since the last reset.
    pub repetitions: u32,

    running: bool,
    /// +1 playing forward, -1 playing backward (ping-pong only).
    direction: f32,

    pub bindings: Vec<PropertyBinding>,

    pub(crate) track_cursors: Vec<KeyframeCursor>,
}

impl AnimationAction {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
            enabled: true,
            repetitions: 0,
            running: false,
            direction: 1.0,
            bindings: Vec::new(),
            track_cursors: vec![KeyframeCursor::default(); track_count],
        }
    }

    #[must_use]
    pub fn with_bindings(mut self, bindings: Vec<PropertyBinding>) -> Self {
        self.bindings = bindings;
        self
    }

    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Starts (or keeps) the action running.
    pub fn play(&mut self) -> &mut Self {
        self.enabled = true;
        self.running = true;
        self
    }

    /// Rewinds to the start without changing running state.
    pub fn reset(&mut self) -> &mut Self {
        self.time = 0.0;
        self.repetitions = 0;
        self.direction = 1.0;
        self.paused = false;
        self.enabled = true;
        self.track_cursors.fill(KeyframeCursor::default());
        self
    }

    /// Stops the action and rewinds it.
    pub fn stop(&mut self) -> &mut Self {
        self.running = false;
        self.reset()
    }

    pub fn set_effective_time_scale(&mut self, time_scale: f32) -> &mut Self {
        self.time_scale = time_scale;
        self
    }

    #[must_use]
    pub fn effective_time_scale(&self) -> f32 {
        if self.paused { 0.0 } else { self.time_scale }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running && self.enabled && !self.paused
    }

    /// Advances clip time by `dt` scaled by `time_scale` and applies the loop mode.
    pub fn update(&mut self, dt: f32) {
        if !self.is_running() {
            return;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        match self.loop_mode {
            LoopMode::Once => {
                self.time += dt * self.time_scale;
                if self.time >= duration {
                    self.time = duration;
                    self.paused = true;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.paused = true;
                }
            }
            LoopMode::Loop => {
                self.time += dt * self.time_scale;
                if self.time >= duration {
                    self.repetitions += (self.time / duration) as u32;
                    self.time %= duration;
                } else if self.time < 0.0 {
                    self.repetitions += 1;
                    self.time = duration + (self.time % duration);
                    if self.time >= duration {
                        self.time = 0.0;
                    }
                }
            }
            LoopMode::PingPong => {
                let step = (dt * self.time_scale).abs() % (duration * 2.0);
                let signed = if self.time_scale < 0.0 { -self.direction } else { self.direction };
                let mut t = self.time + step * signed;
                let mut direction = signed;

                if t > duration {
                    t = 2.0 * duration - t;
                    direction = -direction;
                    self.repetitions += 1;
                }
                if t < 0.0 {
                    t = -t;
                    direction = -direction;
                    self.repetitions += 1;
                }

                self.time = t.clamp(0.0, duration);
                self.direction = if self.time_scale < 0.0 { -direction } else { direction };
            }
        }
    }

    /// Samples track `track_index` at the current time.
    pub fn sample_track(&mut self, track_index: usize) -> Option<TrackValue> {
        let track = self.clip.tracks.get(track_index)?;
        let cursor = self.track_cursors.get_mut(track_index)?;

        match &track.data {
            TrackData::Vector3(t) => t.sample_with_cursor(self.time, cursor).map(TrackValue::Vector3),
            TrackData::Quaternion(t) => {
                t.sample_with_cursor(self.time, cursor).map(TrackValue::Quaternion)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackValue {
    Vector3(glam::Vec3),
    Quaternion(glam::Quat),
}

//! Viewer configuration
//!
//! Everything the viewer reads at start-up: where model files live, which
//! animations are offered, how loaded models are normalized and the playback
//! speed range the UI exposes. All fields have defaults, so a JSON file only
//! needs to name what it overrides.

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::assets::AssetPath;
use crate::errors::{Result, ViewerError};

/// One selectable animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationEntry {
    pub id: String,
    pub display_name: String,
}

impl AnimationEntry {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// How a freshly loaded model is placed in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationSettings {
    /// Largest dimension of the model after scaling.
    pub target_size: f32,
    /// Uniform scale used when the bounds are degenerate or non-finite.
    pub fallback_scale: f32,
}

impl Default for NormalizationSettings {
    fn default() -> Self {
        Self {
            target_size: 2.0,
            fallback_scale: 0.01,
        }
    }
}

/// Playback speed bounds offered by the UI slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub initial_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub speed_step: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            initial_speed: 1.0,
            min_speed: 0.1,
            max_speed: 2.0,
            speed_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory or base URL holding one model file per animation.
    pub models_root: String,
    /// File extension of the model files.
    pub model_format: String,
    pub animations: Vec<AnimationEntry>,
    /// Animation selected on start-up; the first entry when unset.
    pub initial_animation: Option<String>,
    /// Whether `init` selects the initial animation.
    pub autoload: bool,
    /// Keep loaded assets so re-selecting does not fetch again.
    pub cache_assets: bool,
    pub normalization: NormalizationSettings,
    pub playback: PlaybackSettings,
    /// Number of entries kept in the diagnostic log.
    pub diagnostics_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            models_root: "models".to_string(),
            model_format: "glb".to_string(),
            animations: [
                ("Idle", "Idle"),
                ("Walking", "Walking"),
                ("Running", "Running"),
                ("Jumping", "Jumping"),
                ("Sitting", "Sitting"),
                ("Waving", "Waving"),
                ("Dancing", "Dancing"),
            ]
            .into_iter()
            .map(|(id, name)| AnimationEntry::new(id, name))
            .collect(),
            initial_animation: None,
            autoload: true,
            cache_assets: true,
            normalization: NormalizationSettings::default(),
            playback: PlaybackSettings::default(),
            diagnostics_capacity: 256,
        }
    }
}

impl ViewerConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Checks the invariants the controller relies on.
    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for entry in &self.animations {
            if entry.id.trim().is_empty() {
                return Err(ViewerError::Config("animation id must not be empty".into()));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ViewerError::Config(format!(
                    "duplicate animation id '{}'",
                    entry.id
                )));
            }
        }

        if let Some(initial) = &self.initial_animation
            && !seen.contains(initial.as_str())
        {
            return Err(ViewerError::Config(format!(
                "initial animation '{initial}' is not in the animation list"
            )));
        }

        let n = &self.normalization;
        if !(n.target_size.is_finite() && n.target_size > 0.0) {
            return Err(ViewerError::Config(format!(
                "target_size must be positive, got {}",
                n.target_size
            )));
        }
        if !(n.fallback_scale.is_finite() && n.fallback_scale > 0.0) {
            return Err(ViewerError::Config(format!(
                "fallback_scale must be positive, got {}",
                n.fallback_scale
            )));
        }

        let p = &self.playback;
        let ordered = 0.0 < p.min_speed && p.min_speed <= p.initial_speed && p.initial_speed <= p.max_speed;
        if !ordered || !p.max_speed.is_finite() {
            return Err(ViewerError::Config(format!(
                "expected 0 < min_speed <= initial_speed <= max_speed, got {} / {} / {}",
                p.min_speed, p.initial_speed, p.max_speed
            )));
        }
        if !(p.speed_step.is_finite() && p.speed_step > 0.0) {
            return Err(ViewerError::Config(format!(
                "speed_step must be positive, got {}",
                p.speed_step
            )));
        }

        Ok(())
    }

    /// `{models_root}/{animation_id}.{model_format}`
    #[must_use]
    pub fn asset_path(&self, animation_id: &str) -> AssetPath {
        AssetPath::for_animation(&self.models_root, animation_id, &self.model_format)
    }

    /// The animation `init` selects, if any.
    #[must_use]
    pub fn startup_animation(&self) -> Option<&str> {
        if !self.autoload {
            return None;
        }
        self.initial_animation
            .as_deref()
            .or_else(|| self.animations.first().map(|a| a.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ViewerConfig::default().validate().unwrap();
    }

    #[test]
    fn startup_animation_prefers_explicit_choice() {
        let mut config = ViewerConfig {
            initial_animation: Some("Sitting".into()),
            ..ViewerConfig::default()
        };
        assert_eq!(config.startup_animation(), Some("Sitting"));

        config.initial_animation = None;
        assert_eq!(config.startup_animation(), Some("Idle"));

        config.autoload = false;
        assert_eq!(config.startup_animation(), None);
    }
}

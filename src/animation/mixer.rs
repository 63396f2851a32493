use std::sync::Arc;

use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binder::Binder;
use crate::animation::binding::TargetPath;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

/// Drives the actions of one model.
///
/// The mixer is bound to the model's root node; clips are resolved against
/// that subtree when an action is created.
#[derive(Debug)]
pub struct AnimationMixer {
    root: NodeHandle,
    actions: Vec<AnimationAction>,
}

impl AnimationMixer {
    #[must_use]
    pub fn new(root: NodeHandle) -> Self {
        Self {
            root,
            actions: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Returns the action for `clip`, creating and binding it on first use.
    pub fn clip_action(&mut self, scene: &Scene, clip: &Arc<AnimationClip>) -> &mut AnimationAction {
        let index = match self
            .actions
            .iter()
            .position(|a| Arc::ptr_eq(a.clip(), clip))
        {
            Some(index) => index,
            None => {
                let bindings = Binder::bind(scene, self.root, clip);
                log::debug!(
                    "Bound clip '{}': {}/{} tracks",
                    clip.name,
                    bindings.len(),
                    clip.tracks.len()
                );
                self.actions
                    .push(AnimationAction::new(Arc::clone(clip)).with_bindings(bindings));
                self.actions.len() - 1
            }
        };
        &mut self.actions[index]
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> impl Iterator<Item = &mut AnimationAction> {
        self.actions.iter_mut()
    }

    /// Names of the clips this mixer has actions for.
    #[must_use]
    pub fn list_animations(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.clip().name.clone()).collect()
    }

    /// Stops and rewinds every action.
    pub fn stop_all_action(&mut self) {
        for action in &mut self.actions {
            action.stop();
        }
    }

    /// Advances all actions by `dt` and writes the sampled values into the scene.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for action in &mut self.actions {
            action.update(dt);

            if !action.enabled || action.weight <= 0.0 {
                continue;
            }

            for i in 0..action.bindings.len() {
                let binding = action.bindings[i];
                let Some(value) = action.sample_track(binding.track_index) else {
                    continue;
                };
                let Some(node) = scene.get_node_mut(binding.node) else {
                    continue;
                };

                match (value, binding.target) {
                    (TrackValue::Vector3(v), TargetPath::Translation) => node.transform.position = v,
                    (TrackValue::Vector3(v), TargetPath::Scale) => node.transform.scale = v,
                    (TrackValue::Quaternion(q), TargetPath::Rotation) => node.transform.rotation = q,
                    _ => {}
                }
            }
        }
    }
}

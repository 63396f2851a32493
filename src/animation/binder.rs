use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

pub struct Binder;

impl Binder {
    /// Resolves the clip's tracks against the subtree under `root`.
    ///
    /// Tracks whose node name does not exist in the subtree are skipped.
    #[must_use]
    pub fn bind(scene: &Scene, root: NodeHandle, clip: &AnimationClip) -> Vec<PropertyBinding> {
        let names = scene.collect_subtree_names(root);

        clip.tracks
            .iter()
            .enumerate()
            .filter_map(|(track_index, track)| {
                names.get(track.meta.node_name.as_str()).map(|&node| PropertyBinding {
                    track_index,
                    node,
                    target: track.meta.target,
                })
            })
            .collect()
    }
}

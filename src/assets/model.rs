use std::sync::Arc;

use crate::animation::AnimationClip;
use crate::scene::{Mesh, Transform};

/// A node of a loaded model; children refer to indices in [`ModelAsset::nodes`].
#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<usize>,
    pub mesh: Option<Mesh>,
}

impl ModelNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Loaded model data, independent of any scene.
///
/// Instantiated into a scene with [`Scene::instantiate`](crate::scene::Scene::instantiate);
/// the same asset can be instantiated any number of times.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub name: String,
    pub nodes: Vec<ModelNode>,
    pub roots: Vec<usize>,
    pub clips: Vec<Arc<AnimationClip>>,
}

impl ModelAsset {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a node and returns its index. Nodes without a parent must be
    /// listed in `roots` by the caller.
    pub fn push_node(&mut self, node: ModelNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// The clip the viewer plays when this model is shown.
    #[must_use]
    pub fn first_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clips.first()
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.mesh.is_some()).count()
    }

    /// First node reached a second time when walking down from `roots`.
    ///
    /// A valid hierarchy is a forest, so every node is reached at most
    /// once; a repeat means a cycle or a node with two parents. Child
    /// indices past the end of `nodes` are ignored here.
    #[must_use]
    pub fn find_repeated_node(&self) -> Option<usize> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.roots.clone();
        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            if std::mem::replace(&mut seen[index], true) {
                return Some(index);
            }
            stack.extend(node.children.iter().copied());
        }
        None
    }
}

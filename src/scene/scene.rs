use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::assets::ModelAsset;
use crate::scene::bounds::BoundingBox;
use crate::scene::mesh::Mesh;
use crate::scene::node::Node;
use crate::scene::transform_system;
use crate::scene::{MeshKey, NodeHandle};

/// What a [`Scene::remove_node`] call released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disposed {
    pub nodes: usize,
    pub meshes: usize,
}

/// Scene graph
///
/// Owns every node and mesh record. Nodes reference their mesh by key, so
/// removing a node also releases its mesh.
#[derive(Debug, Default)]
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,
    pub meshes: SlotMap<MeshKey, Mesh>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Adds a node at the root level.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeHandle) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            log::warn!("Parent node not found, adding '{}' at root", child.name);
            return self.add_node(child);
        }
        child.parent = Some(parent);
        let handle = self.nodes.insert(child);
        self.nodes[parent].children.push(handle);
        handle
    }

    /// Attaches a mesh record to `node`, replacing any previous one.
    pub fn set_mesh(&mut self, node: NodeHandle, mesh: Mesh) -> Option<MeshKey> {
        let Some(target) = self.nodes.get_mut(node) else {
            return None;
        };
        let key = self.meshes.insert(mesh);
        if let Some(old) = target.mesh.replace(key) {
            self.meshes.remove(old);
        }
        Some(key)
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Removes `handle` and its whole subtree, releasing their meshes.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Disposed {
        let Some(node) = self.nodes.get(handle) else {
            return Disposed::default();
        };

        match node.parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.retain(|&c| c != handle);
                }
            }
            None => self.root_nodes.retain(|&r| r != handle),
        }

        let mut disposed = Disposed::default();
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            disposed.nodes += 1;
            if let Some(mesh) = node.mesh
                && self.meshes.remove(mesh).is_some()
            {
                disposed.meshes += 1;
            }
            stack.extend(node.children);
        }
        disposed
    }

    /// Depth-first search for the first node called `name` under `root`.
    #[must_use]
    pub fn find_node_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let node = self.nodes.get(current)?;
            if node.name == name {
                return Some(current);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Name → handle for the subtree under `root`. The first node visited
    /// (depth-first, document order) wins on duplicate names.
    #[must_use]
    pub fn collect_subtree_names(&self, root: NodeHandle) -> FxHashMap<&str, NodeHandle> {
        let mut names = FxHashMap::default();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            names.entry(node.name.as_str()).or_insert(current);
            stack.extend(node.children.iter().rev());
        }
        names
    }

    /// Recomputes world matrices for the whole scene.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(&mut self.nodes, &self.root_nodes);
    }

    pub fn update_subtree(&mut self, root: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, root);
    }

    /// World-space bounds of every mesh under `root`.
    ///
    /// Uses the current world matrices; call [`Self::update_subtree`] first
    /// after changing transforms. Returns `None` if `root` does not exist.
    #[must_use]
    pub fn world_bounds(&self, root: NodeHandle) -> Option<BoundingBox> {
        if !self.nodes.contains_key(root) {
            return None;
        }
        let mut bounds = BoundingBox::EMPTY;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if let Some(mesh) = node.mesh.and_then(|key| self.meshes.get(key)) {
                bounds = bounds.union(&mesh.bounds.transform(&node.transform.world_matrix));
            }
            stack.extend(node.children.iter().copied());
        }
        Some(bounds)
    }

    /// Creates nodes for `asset` under a new root node named after it.
    ///
    /// The returned root carries an identity transform so callers can place
    /// and scale the whole model through it.
    pub fn instantiate(&mut self, asset: &ModelAsset) -> NodeHandle {
        let root = self.add_node(Node::new(asset.name.clone()));

        let mut stack: Vec<(usize, NodeHandle)> =
            asset.roots.iter().rev().map(|&i| (i, root)).collect();

        let mut visited = vec![false; asset.nodes.len()];

        while let Some((index, parent)) = stack.pop() {
            let Some(source) = asset.nodes.get(index) else {
                log::warn!("Model '{}' references missing node {index}", asset.name);
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                log::warn!("Model '{}' reaches node {index} twice, skipping", asset.name);
                continue;
            }

            let mut node = Node::new(source.name.clone());
            node.transform = source.transform.clone();
            node.transform.mark_dirty();
            let handle = self.add_to_parent(node, parent);

            if let Some(mesh) = &source.mesh {
                self.set_mesh(handle, mesh.clone());
            }

            for &child in source.children.iter().rev() {
                stack.push((child, handle));
            }
        }

        self.update_subtree(root);
        root
    }
}

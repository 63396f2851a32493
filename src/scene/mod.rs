//! Scene graph
//!
//! - Node: hierarchy links, transform and an optional mesh
//! - Transform: TRS with cached matrices
//! - Scene: node and mesh pools, instancing, bounds queries
//! - TransformSystem: world-matrix propagation

pub mod bounds;
pub mod mesh;
pub mod node;
pub mod transform;
pub mod transform_system;
pub mod scene;

pub use bounds::BoundingBox;
pub use mesh::Mesh;
pub use node::Node;
pub use scene::{Disposed, Scene};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
}

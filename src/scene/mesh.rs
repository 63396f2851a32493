use crate::scene::bounds::BoundingBox;

/// CPU-side record of a mesh attached to a node.
///
/// The viewer does not render, so only what the lifecycle needs is kept:
/// the local bounds used for normalization and the sizes used for
/// diagnostics.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub bounds: BoundingBox,
    pub vertex_count: usize,
    pub primitive_count: usize,
    pub skinned: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bounds,
            vertex_count: 0,
            primitive_count: 0,
            skinned: false,
        }
    }
}

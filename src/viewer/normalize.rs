//! Model placement
//!
//! Loaded characters come in arbitrary units and origins. Before a model is
//! shown its root is scaled so the largest extent equals the configured
//! target size, centered horizontally and dropped onto the ground plane.

use glam::{Quat, Vec3};

use crate::config::NormalizationSettings;
use crate::scene::{BoundingBox, NodeHandle, Scene};

/// Extents smaller than this are treated as degenerate.
const MIN_EXTENT: f32 = 1e-6;

/// What [`normalize_model`] applied to the model root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    /// Bounds were usable; the model was fitted to the target size.
    Fitted { scale: f32, offset: Vec3 },
    /// Bounds were empty, non-finite or flat; the fallback scale was used.
    Fallback { scale: f32 },
}

impl Normalization {
    #[must_use]
    pub fn scale(&self) -> f32 {
        match *self {
            Normalization::Fitted { scale, .. } | Normalization::Fallback { scale } => scale,
        }
    }
}

/// Uniform scale that maps `bounds` onto `target_size`, or `None` if the
/// bounds cannot be used.
#[must_use]
pub fn fit_scale(bounds: &BoundingBox, target_size: f32) -> Option<f32> {
    if bounds.is_empty() || !bounds.is_finite() {
        return None;
    }
    let extent = bounds.size().max_element();
    if !extent.is_finite() || extent < MIN_EXTENT {
        return None;
    }
    let scale = target_size / extent;
    scale.is_finite().then_some(scale)
}

/// Scales and places the model rooted at `root`.
///
/// The root transform is reset first, so normalizing twice gives the same
/// result.
pub fn normalize_model(
    scene: &mut Scene,
    root: NodeHandle,
    settings: &NormalizationSettings,
) -> Normalization {
    if let Some(node) = scene.get_node_mut(root) {
        node.transform.position = Vec3::ZERO;
        node.transform.rotation = Quat::IDENTITY;
        node.transform.scale = Vec3::ONE;
    }
    scene.update_subtree(root);

    let bounds = scene.world_bounds(root).unwrap_or(BoundingBox::EMPTY);

    let result = match fit_scale(&bounds, settings.target_size) {
        Some(scale) => {
            let center = bounds.center();
            let offset = Vec3::new(-center.x * scale, -bounds.min.y * scale, -center.z * scale);
            Normalization::Fitted { scale, offset }
        }
        None => Normalization::Fallback {
            scale: settings.fallback_scale,
        },
    };

    if let Some(node) = scene.get_node_mut(root) {
        match result {
            Normalization::Fitted { scale, offset } => {
                node.transform.set_uniform_scale(scale);
                node.transform.position = offset;
            }
            Normalization::Fallback { scale } => {
                node.transform.set_uniform_scale(scale);
            }
        }
    }
    scene.update_subtree(root);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Mesh, Node};

    fn scene_with_mesh(bounds: BoundingBox) -> (Scene, NodeHandle) {
        let mut scene = Scene::new();
        let root = scene.add_node(Node::new("model"));
        let child = scene.add_to_parent(Node::new("body"), root);
        scene.set_mesh(child, Mesh::new("body", bounds));
        (scene, root)
    }

    #[test]
    fn fits_largest_dimension_and_grounds_model() {
        let bounds = BoundingBox::new(Vec3::new(-10.0, 5.0, -20.0), Vec3::new(30.0, 105.0, 0.0));
        let (mut scene, root) = scene_with_mesh(bounds);

        let result = normalize_model(&mut scene, root, &NormalizationSettings::default());
        assert!(matches!(result, Normalization::Fitted { .. }));
        assert!((result.scale() - 0.02).abs() < 1e-6);

        let placed = scene.world_bounds(root).unwrap();
        assert!(placed.min.y.abs() < 1e-5);
        assert!((placed.size().max_element() - 2.0).abs() < 1e-5);
        assert!(placed.center().x.abs() < 1e-5);
        assert!(placed.center().z.abs() < 1e-5);
    }

    #[test]
    fn degenerate_bounds_use_fallback_scale() {
        let flat = BoundingBox::new(Vec3::ONE, Vec3::ONE);
        let (mut scene, root) = scene_with_mesh(flat);

        let result = normalize_model(&mut scene, root, &NormalizationSettings::default());
        assert_eq!(result, Normalization::Fallback { scale: 0.01 });
    }

    #[test]
    fn non_finite_and_empty_bounds_are_rejected() {
        let nan = BoundingBox::new(Vec3::splat(f32::NAN), Vec3::ONE);
        assert_eq!(fit_scale(&nan, 2.0), None);
        assert_eq!(fit_scale(&BoundingBox::EMPTY, 2.0), None);

        let mut scene = Scene::new();
        let root = scene.add_node(Node::new("no meshes"));
        let result = normalize_model(&mut scene, root, &NormalizationSettings::default());
        assert!(matches!(result, Normalization::Fallback { .. }));
    }
}

//! glTF loader
//!
//! Turns a `.glb` / `.gltf` file into a [`ModelAsset`]: node hierarchy with
//! TRS transforms, one mesh record per mesh node (bounds taken from the
//! position accessors' min/max), and every animation as an [`AnimationClip`].
//! Textures and materials are not decoded; the viewer never draws them.

use std::sync::Arc;

use base64::Engine as _;
use glam::{Quat, Vec3};

use crate::animation::{
    AnimationClip, InterpolationMode, KeyframeTrack, TargetPath, Track, TrackData, TrackMeta,
};
use crate::assets::io::AssetReaderVariant;
use crate::assets::loader::ProgressReporter;
use crate::assets::model::{ModelAsset, ModelNode};
use crate::errors::AssetError;
use crate::scene::{BoundingBox, Mesh, Transform};

pub struct GltfLoader;

impl GltfLoader {
    /// Reads `file` through `reader`, resolves its buffers and builds the asset.
    pub async fn load_async(
        reader: &AssetReaderVariant,
        file: &str,
        progress: &ProgressReporter,
    ) -> Result<ModelAsset, AssetError> {
        progress.report(0.0);
        let bytes = reader.read_bytes(file).await?;
        progress.report(0.5);

        let gltf = gltf::Gltf::from_slice(&bytes)?;
        let buffer_count = gltf.buffers().len().max(1);

        let mut buffers = Vec::with_capacity(gltf.buffers().len());
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => Self::blob(&gltf, buffer.index())?,
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    Self::decode_data_uri(uri)?
                }
                gltf::buffer::Source::Uri(uri) => {
                    reader
                        .read_bytes(uri)
                        .await
                        .map_err(|e| AssetError::MissingBuffer {
                            index: buffer.index(),
                            reason: e.to_string(),
                        })?
                }
            };
            Self::check_length(buffer.index(), buffer.length(), &data)?;
            buffers.push(data);
            progress.report(0.5 + 0.4 * buffers.len() as f32 / buffer_count as f32);
        }

        let asset = Self::build_asset(model_name(file), &gltf, &buffers)?;
        progress.report(1.0);
        Ok(asset)
    }

    /// Synchronous variant for self-contained files (GLB or data-URI buffers).
    pub fn load_from_slice(name: &str, bytes: &[u8]) -> Result<ModelAsset, AssetError> {
        let gltf = gltf::Gltf::from_slice(bytes)?;

        let mut buffers = Vec::with_capacity(gltf.buffers().len());
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => Self::blob(&gltf, buffer.index())?,
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    Self::decode_data_uri(uri)?
                }
                gltf::buffer::Source::Uri(uri) => {
                    return Err(AssetError::MissingBuffer {
                        index: buffer.index(),
                        reason: format!("external buffer '{uri}' needs an asset reader"),
                    });
                }
            };
            Self::check_length(buffer.index(), buffer.length(), &data)?;
            buffers.push(data);
        }

        Self::build_asset(name.to_string(), &gltf, &buffers)
    }

    fn blob(gltf: &gltf::Gltf, index: usize) -> Result<Vec<u8>, AssetError> {
        gltf.blob
            .clone()
            .ok_or_else(|| AssetError::MissingBuffer {
                index,
                reason: "missing GLB binary chunk".to_string(),
            })
    }

    fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AssetError> {
        let (header, payload) = uri
            .split_once(',')
            .ok_or_else(|| AssetError::DataUri("missing ',' separator".to_string()))?;
        if !header.ends_with(";base64") {
            return Err(AssetError::DataUri(format!("unsupported encoding '{header}'")));
        }
        Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
    }

    fn check_length(index: usize, expected: usize, data: &[u8]) -> Result<(), AssetError> {
        if data.len() < expected {
            return Err(AssetError::MissingBuffer {
                index,
                reason: format!("expected {expected} bytes, got {}", data.len()),
            });
        }
        Ok(())
    }

    fn build_asset(
        name: String,
        gltf: &gltf::Gltf,
        buffers: &[Vec<u8>],
    ) -> Result<ModelAsset, AssetError> {
        let mut asset = ModelAsset::new(name);

        for node in gltf.nodes() {
            let (translation, rotation, scale) = node.transform().decomposed();
            let mut model_node = ModelNode::new(node_name(&node));
            model_node.transform = Transform::from_trs(
                Vec3::from_array(translation),
                Quat::from_array(rotation),
                Vec3::from_array(scale),
            );
            model_node.children = node.children().map(|c| c.index()).collect();
            model_node.mesh = node.mesh().map(|mesh| Self::mesh_record(&mesh, node.skin().is_some()));
            asset.push_node(model_node);
        }

        asset.roots = match gltf.default_scene().or_else(|| gltf.scenes().next()) {
            Some(scene) => scene.nodes().map(|n| n.index()).collect(),
            None => {
                let mut has_parent = vec![false; asset.nodes.len()];
                for node in &asset.nodes {
                    for &child in &node.children {
                        if let Some(flag) = has_parent.get_mut(child) {
                            *flag = true;
                        }
                    }
                }
                (0..asset.nodes.len()).filter(|&i| !has_parent[i]).collect()
            }
        };

        if let Some(index) = asset.find_repeated_node() {
            return Err(AssetError::Gltf(format!(
                "node {index} is reachable more than once; the node hierarchy must be a tree"
            )));
        }

        asset.clips = Self::load_animations(gltf, buffers)?
            .into_iter()
            .map(Arc::new)
            .collect();

        log::debug!(
            "Parsed glTF '{}': {} nodes, {} meshes, {} clips",
            asset.name,
            asset.nodes.len(),
            asset.mesh_count(),
            asset.clips.len()
        );

        Ok(asset)
    }

    fn mesh_record(mesh: &gltf::Mesh, skinned: bool) -> Mesh {
        let mut bounds = BoundingBox::EMPTY;
        let mut vertex_count = 0;
        let mut primitive_count = 0;

        for primitive in mesh.primitives() {
            primitive_count += 1;
            let Some(positions) = primitive.get(&gltf::Semantic::Positions) else {
                continue;
            };
            vertex_count += positions.count();
            if let (Some(min), Some(max)) = (positions.min(), positions.max())
                && let (Some(min), Some(max)) = (vec3_from_json(&min), vec3_from_json(&max))
            {
                bounds = bounds.union(&BoundingBox::new(min, max));
            }
        }

        let name = mesh
            .name()
            .map_or_else(|| format!("Mesh_{}", mesh.index()), str::to_string);

        Mesh {
            name,
            bounds,
            vertex_count,
            primitive_count,
            skinned,
        }
    }

    fn load_animations(
        gltf: &gltf::Gltf,
        buffers: &[Vec<u8>],
    ) -> Result<Vec<AnimationClip>, AssetError> {
        let mut animations = Vec::new();

        for anim in gltf.animations() {
            let mut tracks = Vec::new();

            for (channel_index, channel) in anim.channels().enumerate() {
                let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
                let target = channel.target();
                let node_name = node_name(&target.node());

                let times: Vec<f32> = reader
                    .read_inputs()
                    .ok_or_else(|| {
                        AssetError::Gltf(format!("animation channel {channel_index} has no input"))
                    })?
                    .collect();

                let interpolation = match channel.sampler().interpolation() {
                    gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                    gltf::animation::Interpolation::Step => InterpolationMode::Step,
                    gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
                };

                let Some(outputs) = reader.read_outputs() else {
                    return Err(AssetError::Gltf(format!(
                        "animation channel {channel_index} has no output"
                    )));
                };

                let (target_path, data) = match outputs {
                    gltf::animation::util::ReadOutputs::Translations(iter) => (
                        TargetPath::Translation,
                        TrackData::Vector3(KeyframeTrack::new(
                            times,
                            iter.map(Vec3::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    gltf::animation::util::ReadOutputs::Rotations(iter) => (
                        TargetPath::Rotation,
                        TrackData::Quaternion(KeyframeTrack::new(
                            times,
                            iter.into_f32().map(Quat::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    gltf::animation::util::ReadOutputs::Scales(iter) => (
                        TargetPath::Scale,
                        TrackData::Vector3(KeyframeTrack::new(
                            times,
                            iter.map(Vec3::from_array).collect(),
                            interpolation,
                        )),
                    ),
                    gltf::animation::util::ReadOutputs::MorphTargetWeights(_) => continue,
                };

                tracks.push(Track {
                    meta: TrackMeta {
                        node_name,
                        target: target_path,
                    },
                    data,
                });
            }

            let name = anim
                .name()
                .map_or_else(|| format!("Animation_{}", anim.index()), str::to_string);
            animations.push(AnimationClip::new(name, tracks));
        }

        Ok(animations)
    }
}

/// Reads an accessor `min`/`max` array; positions always have three components.
fn vec3_from_json(value: &serde_json::Value) -> Option<Vec3> {
    let array = value.as_array()?;
    if array.len() < 3 {
        return None;
    }
    let mut out = [0.0_f32; 3];
    for (slot, component) in out.iter_mut().zip(array) {
        *slot = component.as_f64()? as f32;
    }
    Some(Vec3::from_array(out))
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map_or_else(|| format!("Node_{}", node.index()), str::to_string)
}

fn model_name(file: &str) -> String {
    let file = file.rsplit('/').next().unwrap_or(file);
    file.rsplit_once('.')
        .map_or(file, |(stem, _)| stem)
        .to_string()
}

use super::ImportedModel;
use crate::config::DEFAULT_MAX_HIERARCHY_DEPTH;
use crate::source::{AnimationSource, SkinBoneSource, SourceChannel, SourceInterpolation, SourceKey, SourceNode};
use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::{ReadOutputs, Rotations};
use gltf::animation::{Interpolation, Property};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

pub fn load_model_from_gltf(path: impl AsRef<Path>) -> Result<ImportedModel> {
    let path_ref = path.as_ref();
    let (document, buffers, _) = gltf::import(path_ref)
        .with_context(|| format!("Failed to import GLTF model from {}", path_ref.display()))?;

    let model_name = path_ref.file_stem().and_then(|stem| stem.to_str()).unwrap_or("model").to_string();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| anyhow!("GLTF '{}' does not contain a scene", path_ref.display()))?;
    let scene_roots: Vec<gltf::Node> = scene.nodes().collect();
    let root = match scene_roots.as_slice() {
        [] => bail!("GLTF '{}' scene has no nodes", path_ref.display()),
        [single] => build_source_node(single, 0)?,
        many => {
            let mut wrapper = SourceNode::new(scene.name().unwrap_or("scene_root"), Mat4::IDENTITY);
            for node in many {
                wrapper.children.push(build_source_node(node, 1)?);
            }
            wrapper
        }
    };

    let mut skins = document.skins();
    let (skin, vertex_count) = match skins.next() {
        Some(skin) => {
            if skins.next().is_some() {
                warn!(
                    "[assets] GLTF '{}' contains multiple skins; only the first will be imported.",
                    path_ref.display()
                );
            }
            read_skin(&document, &skin, &buffers)?
        }
        None => {
            warn!("[assets] GLTF '{}' has no skin; animated bones will use identity offsets.", path_ref.display());
            (Vec::new(), 0)
        }
    };

    let mut animations = Vec::new();
    for (anim_index, animation) in document.animations().enumerate() {
        let clip_name =
            animation.name().map(|n| n.to_string()).unwrap_or_else(|| format!("animation_{anim_index}"));
        let channels = read_channels(&clip_name, &animation, &buffers)?;
        if channels.is_empty() {
            warn!("[assets] animation '{clip_name}' has no usable channels; skipping.");
            continue;
        }
        let duration = channels
            .iter()
            .flat_map(|channel| {
                let positions = channel.positions.last().map(|key| key.time);
                let rotations = channel.rotations.last().map(|key| key.time);
                let scales = channel.scales.last().map(|key| key.time);
                [positions, rotations, scales]
            })
            .flatten()
            .fold(0.0_f32, f32::max);
        if !(duration > 0.0) {
            warn!("[assets] animation '{clip_name}' has every key at t=0 (no playable length); skipping.");
            continue;
        }
        animations.push(AnimationSource {
            name: clip_name,
            duration,
            // GLTF keys are in seconds
            ticks_per_second: 1.0,
            root: Some(root.clone()),
            channels,
        });
    }

    debug!(
        "[assets] imported '{}': {} skin bones, {} vertices, {} animations.",
        model_name,
        skin.len(),
        vertex_count,
        animations.len()
    );
    Ok(ImportedModel { name: model_name, vertex_count, skin, animations })
}

fn node_name(node: &gltf::Node) -> String {
    node.name().map(|n| n.to_string()).unwrap_or_else(|| format!("node_{}", node.index()))
}

fn build_source_node(node: &gltf::Node, depth: usize) -> Result<SourceNode> {
    if depth >= DEFAULT_MAX_HIERARCHY_DEPTH {
        bail!("GLTF node '{}' is nested deeper than {} levels", node_name(node), DEFAULT_MAX_HIERARCHY_DEPTH);
    }
    let mut source = SourceNode::new(node_name(node), mat4_from_gltf(node.transform().matrix()));
    for child in node.children() {
        source.children.push(build_source_node(&child, depth + 1)?);
    }
    Ok(source)
}

fn read_skin(
    document: &gltf::Document,
    skin: &gltf::Skin,
    buffers: &[gltf::buffer::Data],
) -> Result<(Vec<SkinBoneSource>, usize)> {
    let joint_nodes: Vec<_> = skin.joints().collect();
    if joint_nodes.is_empty() {
        bail!("GLTF skin '{}' has no joints", skin.name().unwrap_or("unnamed"));
    }

    let skin_reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let mut inverse_bind = vec![Mat4::IDENTITY; joint_nodes.len()];
    if let Some(reader) = skin_reader.read_inverse_bind_matrices() {
        for (idx, matrix) in reader.enumerate() {
            if idx < inverse_bind.len() {
                inverse_bind[idx] = mat4_from_gltf(matrix);
            }
        }
    }

    let mut bones: Vec<SkinBoneSource> = joint_nodes
        .iter()
        .zip(inverse_bind)
        .map(|(node, offset)| SkinBoneSource { name: node_name(node), offset, weights: Vec::new() })
        .collect();

    let mut vertex_offset = 0_usize;
    for node in document.nodes() {
        let uses_skin = node.skin().map(|s| s.index() == skin.index()).unwrap_or(false);
        let Some(mesh) = node.mesh().filter(|_| uses_skin) else {
            continue;
        };
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let count = positions.count();
            if let (Some(joints), Some(weights)) = (reader.read_joints(0), reader.read_weights(0)) {
                for (vertex, (joint_set, weight_set)) in joints.into_u16().zip(weights.into_f32()).enumerate() {
                    for (joint, weight) in joint_set.iter().zip(weight_set.iter()) {
                        if *weight <= 0.0 {
                            continue;
                        }
                        let Some(bone) = bones.get_mut(*joint as usize) else {
                            bail!("GLTF mesh '{}' references joint {} outside the skin", node_name(&node), joint);
                        };
                        bone.weights.push(((vertex_offset + vertex) as u32, *weight));
                    }
                }
            }
            vertex_offset += count;
        }
    }

    Ok((bones, vertex_offset))
}

/// Keys for one animated property plus the interpolation of the sampler that produced them.
struct SampledKeys<T> {
    interpolation: SourceInterpolation,
    keys: Vec<SourceKey<T>>,
}

struct ChannelBuilder {
    translations: Option<SampledKeys<Vec3>>,
    rotations: Option<SampledKeys<Quat>>,
    scales: Option<SampledKeys<Vec3>>,
    rest: (Vec3, Quat, Vec3),
}

impl ChannelBuilder {
    fn new(rest: (Vec3, Quat, Vec3)) -> Self {
        Self { translations: None, rotations: None, scales: None, rest }
    }

    fn into_channel(self, bone: String) -> SourceChannel {
        let (rest_translation, rest_rotation, rest_scale) = self.rest;
        let (position_interpolation, positions) = split_or_rest(self.translations, rest_translation);
        let (rotation_interpolation, rotations) = split_or_rest(self.rotations, rest_rotation);
        let (scale_interpolation, scales) = split_or_rest(self.scales, rest_scale);
        SourceChannel {
            bone,
            position_interpolation,
            rotation_interpolation,
            scale_interpolation,
            positions,
            rotations,
            scales,
        }
    }
}

fn split_or_rest<T>(sampled: Option<SampledKeys<T>>, rest: T) -> (SourceInterpolation, Vec<SourceKey<T>>) {
    match sampled {
        Some(sampled) => (sampled.interpolation, sampled.keys),
        None => (SourceInterpolation::Linear, vec![SourceKey::new(0.0, rest)]),
    }
}

fn read_channels(
    clip_name: &str,
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
) -> Result<Vec<SourceChannel>> {
    let mut builders: HashMap<usize, (String, ChannelBuilder)> = HashMap::new();
    let mut order: Vec<usize> = Vec::new();

    for channel in animation.channels() {
        let target_node = channel.target().node();
        let interpolation = channel.sampler().interpolation();
        if interpolation == Interpolation::CubicSpline {
            warn!(
                "[assets] animation '{}' uses CubicSpline interpolation; skipping channel (node {}).",
                clip_name,
                node_name(&target_node)
            );
            continue;
        }

        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        if times.is_empty() {
            continue;
        }
        let Some(outputs) = reader.read_outputs() else {
            continue;
        };

        let node_index = target_node.index();
        let (_, builder) = builders.entry(node_index).or_insert_with(|| {
            order.push(node_index);
            let (t, r, s) = target_node.transform().decomposed();
            let rest = (Vec3::from_array(t), Quat::from_array(r).normalize(), Vec3::from_array(s));
            (node_name(&target_node), ChannelBuilder::new(rest))
        });
        let interpolation =
            if interpolation == Interpolation::Step { SourceInterpolation::Step } else { SourceInterpolation::Linear };

        match (channel.target().property(), outputs) {
            (Property::Translation, ReadOutputs::Translations(values)) => {
                let values: Vec<Vec3> = values.map(Vec3::from_array).collect();
                let keys = zip_keys(clip_name, &target_node, &times, values)?;
                builder.translations = Some(SampledKeys { interpolation, keys });
            }
            (Property::Scale, ReadOutputs::Scales(values)) => {
                let values: Vec<Vec3> = values.map(Vec3::from_array).collect();
                let keys = zip_keys(clip_name, &target_node, &times, values)?;
                builder.scales = Some(SampledKeys { interpolation, keys });
            }
            (Property::Rotation, ReadOutputs::Rotations(rotations)) => {
                let values = convert_rotations(rotations);
                let keys = zip_keys(clip_name, &target_node, &times, values)?;
                builder.rotations = Some(SampledKeys { interpolation, keys });
            }
            (Property::MorphTargetWeights, _) => {
                // Morph targets are outside the skeletal pipeline.
            }
            _ => {}
        }
    }

    let mut channels = Vec::with_capacity(order.len());
    for node_index in order {
        if let Some((name, builder)) = builders.remove(&node_index) {
            if builder.translations.is_none() && builder.rotations.is_none() && builder.scales.is_none() {
                continue;
            }
            channels.push(builder.into_channel(name));
        }
    }
    Ok(channels)
}

fn zip_keys<T>(clip_name: &str, node: &gltf::Node, times: &[f32], values: Vec<T>) -> Result<Vec<SourceKey<T>>> {
    if values.len() != times.len() {
        bail!(
            "Animation '{}' channel count mismatch on node '{}' ({} times vs {} values)",
            clip_name,
            node_name(node),
            times.len(),
            values.len()
        );
    }
    Ok(times.iter().copied().zip(values).map(|(time, value)| SourceKey::new(time, value)).collect())
}

fn convert_rotations(rotations: Rotations) -> Vec<Quat> {
    rotations
        .into_f32()
        .map(|components| {
            let quat = Quat::from_array(components);
            if quat.length_squared() > 0.0 {
                quat.normalize()
            } else {
                Quat::IDENTITY
            }
        })
        .collect()
}

fn mat4_from_gltf(matrix: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(&matrix)
}

//! Shapes handed over by the import collaborators. Everything here is plain data and deserializes
//! from the JSON model files used by fixtures and tooling.

use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct SourceNode {
    pub name: String,
    #[serde(default = "identity")]
    pub transform: Mat4,
    #[serde(default)]
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self { name: name.into(), transform, children: Vec::new() }
    }

    pub fn with_child(mut self, child: SourceNode) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceInterpolation {
    Step,
    #[default]
    Linear,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SourceKey<T> {
    pub time: f32,
    pub value: T,
}

impl<T> SourceKey<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SourceChannel {
    pub bone: String,
    #[serde(default)]
    pub position_interpolation: SourceInterpolation,
    #[serde(default)]
    pub rotation_interpolation: SourceInterpolation,
    #[serde(default)]
    pub scale_interpolation: SourceInterpolation,
    #[serde(default)]
    pub positions: Vec<SourceKey<Vec3>>,
    #[serde(default)]
    pub rotations: Vec<SourceKey<Quat>>,
    #[serde(default)]
    pub scales: Vec<SourceKey<Vec3>>,
}

impl SourceChannel {
    /// A channel holding the rest pose as single keys; callers replace whichever sequences are animated.
    pub fn rest(bone: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            position_interpolation: SourceInterpolation::Linear,
            rotation_interpolation: SourceInterpolation::Linear,
            scale_interpolation: SourceInterpolation::Linear,
            positions: vec![SourceKey::new(0.0, Vec3::ZERO)],
            rotations: vec![SourceKey::new(0.0, Quat::IDENTITY)],
            scales: vec![SourceKey::new(0.0, Vec3::ONE)],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnimationSource {
    pub name: String,
    pub duration: f32,
    #[serde(default)]
    pub ticks_per_second: f32,
    #[serde(default)]
    pub root: Option<SourceNode>,
    #[serde(default)]
    pub channels: Vec<SourceChannel>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SkinBoneSource {
    pub name: String,
    #[serde(default = "identity")]
    pub offset: Mat4,
    /// `(vertex index, weight)` pairs.
    #[serde(default)]
    pub weights: Vec<(u32, f32)>,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

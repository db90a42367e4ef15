use crate::error::{ChannelKind, SkeletalLoadError};
use crate::keyframes::{build_track, KeyframeTrack};
use crate::source::SourceChannel;
use glam::{Mat4, Quat, Vec3};
use std::sync::Arc;

/// Keyframes driving a single bone. Every sequence holds at least one key.
#[derive(Clone, Debug)]
pub struct BoneTrack {
    pub name: Arc<str>,
    pub id: u32,
    pub positions: KeyframeTrack<Vec3>,
    pub rotations: KeyframeTrack<Quat>,
    pub scales: KeyframeTrack<Vec3>,
}

impl BoneTrack {
    pub fn from_channel(id: u32, channel: &SourceChannel) -> Result<Self, SkeletalLoadError> {
        let bone = channel.bone.as_str();
        Ok(Self {
            name: Arc::from(bone),
            id,
            positions: build_track(
                bone,
                ChannelKind::Position,
                channel.position_interpolation.into(),
                &channel.positions,
            )?,
            rotations: build_track(
                bone,
                ChannelKind::Rotation,
                channel.rotation_interpolation.into(),
                &channel.rotations,
            )?,
            scales: build_track(bone, ChannelKind::Scale, channel.scale_interpolation.into(), &channel.scales)?,
        })
    }

    pub fn position_at(&self, time: f32) -> Vec3 {
        self.positions.sample(time)
    }

    pub fn rotation_at(&self, time: f32) -> Quat {
        self.rotations.sample(time)
    }

    pub fn scale_at(&self, time: f32) -> Vec3 {
        self.scales.sample(time)
    }

    /// Local transform at `time` (ticks), composed as translation * rotation * scale.
    pub fn evaluate(&self, time: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale_at(time), self.rotation_at(time), self.position_at(time))
    }

    /// Latest key time across the three sequences.
    pub fn end_time(&self) -> f32 {
        self.positions.last_time().max(self.rotations.last_time()).max(self.scales.last_time())
    }
}

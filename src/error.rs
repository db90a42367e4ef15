use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Position,
    Rotation,
    Scale,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Position => write!(f, "position"),
            ChannelKind::Rotation => write!(f, "rotation"),
            ChannelKind::Scale => write!(f, "scale"),
        }
    }
}

/// Failures raised while turning imported data into a skeleton animation or skin binding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SkeletalLoadError {
    #[error("animation '{animation}' has no root node")]
    MissingRoot { animation: String },
    #[error("animation '{animation}' does not contain any bone channels")]
    NoChannels { animation: String },
    #[error("animation '{animation}' has degenerate duration {duration} (must be finite and > 0)")]
    DegenerateDuration { animation: String, duration: f32 },
    #[error("bone '{bone}' {channel} channel has no keyframes")]
    EmptyKeyframes { bone: String, channel: ChannelKind },
    #[error("bone '{bone}' {channel} channel contains a non-finite keyframe")]
    NonFiniteKeyframe { bone: String, channel: ChannelKind },
    #[error("bone '{bone}' {channel} channel time cannot be negative ({time})")]
    NegativeKeyframeTime { bone: String, channel: ChannelKind, time: f32 },
    #[error("node hierarchy exceeds the depth limit of {limit} at node '{node}'")]
    HierarchyTooDeep { node: String, limit: usize },
    #[error("skin bone '{bone}' weights vertex {vertex} but the mesh only has {vertex_count} vertices")]
    VertexOutOfRange { bone: String, vertex: u32, vertex_count: usize },
}

pub mod animation;
pub mod animation_validation;
pub mod assets;
pub mod bone_registry;
pub mod bone_track;
pub mod cli;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod keyframes;
pub mod model;
pub mod player;
pub mod skin;
pub mod source;

pub use animation::SkeletonAnimation;
pub use bone_registry::{BoneIndexRegistry, BoneInfo};
pub use bone_track::BoneTrack;
pub use error::SkeletalLoadError;
pub use hierarchy::NodeSnapshot;
pub use model::SkinnedModel;
pub use player::{AnimationPlayer, BonePalette, PlaybackState, UpdateStats};

use crate::bone_registry::{BoneIndexRegistry, BoneInfo};
use crate::bone_track::BoneTrack;
use crate::config::AnimationConfig;
use crate::error::SkeletalLoadError;
use crate::hierarchy::NodeSnapshot;
use crate::source::AnimationSource;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// One imported clip: the node tree it animates, the tracks of its animated bones and the
/// bone-info map shared with the skinned mesh. Immutable once built.
#[derive(Clone, Debug)]
pub struct SkeletonAnimation {
    name: Arc<str>,
    duration: f32,
    ticks_per_second: f32,
    root: NodeSnapshot,
    tracks: HashMap<Arc<str>, BoneTrack>,
    bone_infos: HashMap<Arc<str>, BoneInfo>,
    unskinned_bones: Vec<Arc<str>>,
}

impl SkeletonAnimation {
    /// Builds the clip, registering channel bones the mesh skin did not know about. The registry is
    /// only touched once every channel has validated, so a failed load leaves it unchanged.
    pub fn from_source(
        source: &AnimationSource,
        registry: &mut BoneIndexRegistry,
        config: &AnimationConfig,
    ) -> Result<Self, SkeletalLoadError> {
        if !source.duration.is_finite() || source.duration <= 0.0 {
            return Err(SkeletalLoadError::DegenerateDuration {
                animation: source.name.clone(),
                duration: source.duration,
            });
        }
        let root_source =
            source.root.as_ref().ok_or_else(|| SkeletalLoadError::MissingRoot { animation: source.name.clone() })?;
        if source.channels.is_empty() {
            return Err(SkeletalLoadError::NoChannels { animation: source.name.clone() });
        }

        let root = NodeSnapshot::copy_from(root_source, config.max_hierarchy_depth)?;

        let mut pending: Vec<BoneTrack> = Vec::with_capacity(source.channels.len());
        for channel in &source.channels {
            pending.push(BoneTrack::from_channel(0, channel)?);
        }

        let mut tracks: HashMap<Arc<str>, BoneTrack> = HashMap::with_capacity(pending.len());
        let mut unskinned_bones = Vec::new();
        for mut track in pending {
            if !registry.contains(&track.name) {
                if config.warn_on_identity_offset {
                    warn!(
                        "[animation] '{}': bone '{}' has no skin data; using an identity offset matrix.",
                        source.name, track.name
                    );
                }
                unskinned_bones.push(Arc::clone(&track.name));
            }
            track.id = registry.id_for(&track.name);
            if let Some(previous) = tracks.insert(Arc::clone(&track.name), track) {
                warn!(
                    "[animation] '{}': duplicate channel for bone '{}'; keeping the later one.",
                    source.name, previous.name
                );
            }
        }

        let ticks_per_second = if source.ticks_per_second.is_finite() && source.ticks_per_second > 0.0 {
            source.ticks_per_second
        } else {
            warn!(
                "[animation] '{}' declares {} ticks per second; using {}.",
                source.name, source.ticks_per_second, config.default_ticks_per_second
            );
            config.default_ticks_per_second
        };

        for track in tracks.values() {
            if track.end_time() > source.duration {
                debug!(
                    "[animation] '{}': bone '{}' has keys past the clip duration ({} > {}).",
                    source.name,
                    track.name,
                    track.end_time(),
                    source.duration
                );
            }
        }

        debug!(
            "[animation] loaded '{}': {} nodes, {} tracks, {} registered bones.",
            source.name,
            root.node_count(),
            tracks.len(),
            registry.len()
        );

        Ok(Self {
            name: Arc::from(source.name.as_str()),
            duration: source.duration,
            ticks_per_second,
            root,
            tracks,
            bone_infos: registry.bone_infos().clone(),
            unskinned_bones,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration / self.ticks_per_second
    }

    pub fn root(&self) -> &NodeSnapshot {
        &self.root
    }

    /// Track for `name`, or `None` for nodes that are not animated (they keep their bind pose).
    pub fn find_track(&self, name: &str) -> Option<&BoneTrack> {
        self.tracks.get(name)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &BoneTrack> {
        self.tracks.values()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn bone_info(&self, name: &str) -> Option<&BoneInfo> {
        self.bone_infos.get(name)
    }

    pub fn bone_infos(&self) -> &HashMap<Arc<str>, BoneInfo> {
        &self.bone_infos
    }

    /// Number of palette slots this clip can write.
    pub fn bone_count(&self) -> usize {
        self.bone_infos.values().map(|info| info.id as usize + 1).max().unwrap_or(0)
    }

    /// Bones that only appeared in animation channels and therefore skin with an identity offset.
    pub fn unskinned_bones(&self) -> &[Arc<str>] {
        &self.unskinned_bones
    }
}

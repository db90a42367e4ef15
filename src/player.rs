use crate::animation::SkeletonAnimation;
use crate::config::DEFAULT_MAX_BONES;
use crate::hierarchy::NodeSnapshot;
use glam::Mat4;
use log::{debug, warn};
use std::sync::Arc;

/// Final skinning matrices indexed by bone id. Slots that were never written hold identity.
#[derive(Clone, Debug)]
pub struct BonePalette {
    matrices: Vec<Mat4>,
}

impl BonePalette {
    pub fn new(capacity: usize) -> Self {
        Self { matrices: vec![Mat4::IDENTITY; capacity] }
    }

    pub fn capacity(&self) -> usize {
        self.matrices.len()
    }

    pub fn get(&self, id: u32) -> Option<&Mat4> {
        self.matrices.get(id as usize)
    }

    pub fn as_slice(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Column-major `f32` bytes, ready for a uniform/storage buffer write.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }

    pub fn reset(&mut self) {
        self.matrices.fill(Mat4::IDENTITY);
    }

    fn write(&mut self, id: u32, matrix: Mat4) -> bool {
        match self.matrices.get_mut(id as usize) {
            Some(slot) => {
                *slot = matrix;
                true
            }
            None => false,
        }
    }
}

impl Default for BonePalette {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BONES)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Counters from the most recent hierarchy walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub nodes_visited: usize,
    pub tracks_evaluated: usize,
    pub bones_written: usize,
    pub bones_skipped: usize,
}

/// Drives one animation at a time and owns the palette it writes. `update` and `play` take
/// `&mut self`, so the palette cannot be read while a walk is in flight.
#[derive(Debug)]
pub struct AnimationPlayer {
    animation: Option<Arc<SkeletonAnimation>>,
    time: f32,
    palette: BonePalette,
    stats: UpdateStats,
}

impl AnimationPlayer {
    pub fn new(max_bones: usize) -> Self {
        Self { animation: None, time: 0.0, palette: BonePalette::new(max_bones), stats: UpdateStats::default() }
    }

    pub fn state(&self) -> PlaybackState {
        if self.animation.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Idle
        }
    }

    pub fn animation(&self) -> Option<&Arc<SkeletonAnimation>> {
        self.animation.as_ref()
    }

    /// Current playback position in ticks.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn final_bone_matrices(&self) -> &BonePalette {
        &self.palette
    }

    pub fn last_update_stats(&self) -> UpdateStats {
        self.stats
    }

    pub fn play(&mut self, animation: Arc<SkeletonAnimation>) {
        let capacity = self.palette.capacity();
        if animation.bone_count() > capacity {
            warn!(
                "[player] '{}' uses {} bones but the palette holds {}; extra bones will not be written.",
                animation.name(),
                animation.bone_count(),
                capacity
            );
        }
        debug!("[player] playing '{}' ({:.3}s).", animation.name(), animation.duration_seconds());
        self.animation = Some(animation);
        self.time = 0.0;
    }

    pub fn stop(&mut self) {
        self.animation = None;
        self.time = 0.0;
    }

    /// Advances by `dt` seconds, wrapping at the clip duration, then recomputes every bone matrix.
    pub fn update(&mut self, dt: f32) {
        let Some(animation) = self.animation.clone() else {
            return;
        };
        let advanced = self.time + animation.ticks_per_second() * dt;
        self.time = wrap_time(advanced, animation.duration());
        self.compute_transforms(&animation);
    }

    /// Jumps to `time` ticks (wrapped into the clip) and recomputes the pose.
    pub fn seek(&mut self, time: f32) {
        let Some(animation) = self.animation.clone() else {
            return;
        };
        self.time = wrap_time(time, animation.duration());
        self.compute_transforms(&animation);
    }

    /// Back to identity matrices at time zero; the active animation stays assigned.
    pub fn reset_pose(&mut self) {
        self.time = 0.0;
        self.palette.reset();
        self.stats = UpdateStats::default();
    }

    fn compute_transforms(&mut self, animation: &SkeletonAnimation) {
        let mut stats = UpdateStats::default();
        walk_node(animation, animation.root(), Mat4::IDENTITY, self.time, &mut self.palette, &mut stats);
        self.stats = stats;
    }
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BONES)
    }
}

fn wrap_time(time: f32, duration: f32) -> f32 {
    if !time.is_finite() {
        return 0.0;
    }
    let wrapped = time.rem_euclid(duration);
    // rem_euclid can round up to `duration` for tiny negative inputs
    if wrapped >= duration {
        0.0
    } else {
        wrapped
    }
}

fn walk_node(
    animation: &SkeletonAnimation,
    node: &NodeSnapshot,
    parent_world: Mat4,
    time: f32,
    palette: &mut BonePalette,
    stats: &mut UpdateStats,
) {
    stats.nodes_visited += 1;
    let local = match animation.find_track(&node.name) {
        Some(track) => {
            stats.tracks_evaluated += 1;
            track.evaluate(time)
        }
        None => node.bind_local,
    };
    let world = parent_world * local;

    if let Some(info) = animation.bone_info(&node.name) {
        if palette.write(info.id, world * info.offset) {
            stats.bones_written += 1;
        } else {
            stats.bones_skipped += 1;
        }
    }

    for child in &node.children {
        walk_node(animation, child, world, time, palette, stats);
    }
}

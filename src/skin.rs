use crate::bone_registry::BoneIndexRegistry;
use crate::error::SkeletalLoadError;
use crate::source::SkinBoneSource;
use bytemuck::{Pod, Zeroable};
use log::{debug, warn};

pub const MAX_BONE_INFLUENCE: usize = 4;

/// Per-vertex skinning attributes as the vertex shader reads them. Unused slots carry id -1.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexInfluences {
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for VertexInfluences {
    fn default() -> Self {
        Self { bone_ids: [-1; MAX_BONE_INFLUENCE], weights: [0.0; MAX_BONE_INFLUENCE] }
    }
}

impl VertexInfluences {
    /// Adds an influence; once all slots are taken the lightest one is replaced by a heavier newcomer.
    /// Returns false when the influence was dropped.
    pub fn add(&mut self, bone_id: u32, weight: f32) -> bool {
        if let Some(slot) = self.bone_ids.iter().position(|id| *id < 0) {
            self.bone_ids[slot] = bone_id as i32;
            self.weights[slot] = weight;
            return true;
        }
        let (lightest, lightest_weight) = self
            .weights
            .iter()
            .copied()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, f32::MAX));
        if weight > lightest_weight {
            self.bone_ids[lightest] = bone_id as i32;
            self.weights[lightest] = weight;
        }
        false
    }

    pub fn influence_count(&self) -> usize {
        self.bone_ids.iter().filter(|id| **id >= 0).count()
    }

    pub fn normalize(&mut self) {
        let total: f32 = self.weights.iter().sum();
        if total > 0.0 {
            for weight in &mut self.weights {
                *weight /= total;
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SkinBinding {
    pub vertices: Vec<VertexInfluences>,
    /// Influences that did not fit in `MAX_BONE_INFLUENCE` slots as first assigned.
    pub overflowed_influences: usize,
}

impl SkinBinding {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Registers every skin bone with its offset matrix and folds the per-bone weight lists into
/// per-vertex influences. Runs before any animation is loaded so skin bones get the low ids.
pub fn build_skin(
    vertex_count: usize,
    bones: &[SkinBoneSource],
    registry: &mut BoneIndexRegistry,
) -> Result<SkinBinding, SkeletalLoadError> {
    for bone in bones {
        if let Some(&(vertex, _)) = bone.weights.iter().find(|(vertex, _)| *vertex as usize >= vertex_count) {
            return Err(SkeletalLoadError::VertexOutOfRange { bone: bone.name.clone(), vertex, vertex_count });
        }
    }

    let mut binding = SkinBinding { vertices: vec![VertexInfluences::default(); vertex_count], overflowed_influences: 0 };
    for bone in bones {
        let id = registry.register(&bone.name, bone.offset);
        for &(vertex, weight) in &bone.weights {
            if weight <= 0.0 || !weight.is_finite() {
                continue;
            }
            if !binding.vertices[vertex as usize].add(id, weight) {
                binding.overflowed_influences += 1;
            }
        }
    }
    for vertex in &mut binding.vertices {
        vertex.normalize();
    }

    if binding.overflowed_influences > 0 {
        warn!(
            "[skin] {} influences exceeded {} bones per vertex; kept the heaviest.",
            binding.overflowed_influences, MAX_BONE_INFLUENCE
        );
    }
    debug!("[skin] bound {} vertices to {} bones.", vertex_count, bones.len());
    Ok(binding)
}

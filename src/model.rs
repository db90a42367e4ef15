use crate::animation::SkeletonAnimation;
use crate::assets::{self, ImportedModel};
use crate::bone_registry::BoneIndexRegistry;
use crate::config::AnimationConfig;
use crate::player::AnimationPlayer;
use crate::skin::{build_skin, SkinBinding};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;
use std::sync::Arc;

/// A loaded model: the skin binding, the shared bone registry and every animation clip built
/// against that registry.
#[derive(Debug)]
pub struct SkinnedModel {
    pub name: String,
    pub registry: BoneIndexRegistry,
    pub skin: SkinBinding,
    pub animations: Vec<Arc<SkeletonAnimation>>,
}

impl SkinnedModel {
    pub fn load(path: impl AsRef<Path>, config: &AnimationConfig) -> Result<Self> {
        let path = path.as_ref();
        let imported = assets::load_model(path)?;
        Self::from_import(&imported, config).with_context(|| format!("Failed to build model {}", path.display()))
    }

    /// Skin bones register first so their ids match the vertex attributes; animation-only bones follow.
    pub fn from_import(imported: &ImportedModel, config: &AnimationConfig) -> Result<Self> {
        let mut registry = BoneIndexRegistry::new();
        let skin = build_skin(imported.vertex_count, &imported.skin, &mut registry)
            .with_context(|| format!("Invalid skin in '{}'", imported.name))?;

        let mut animations = Vec::with_capacity(imported.animations.len());
        for source in &imported.animations {
            let animation = SkeletonAnimation::from_source(source, &mut registry, config)
                .with_context(|| format!("Invalid animation '{}' in '{}'", source.name, imported.name))?;
            animations.push(Arc::new(animation));
        }

        info!(
            "[model] '{}' ready: {} bones, {} vertices, {} animations.",
            imported.name,
            registry.len(),
            skin.vertices.len(),
            animations.len()
        );
        Ok(Self { name: imported.name.clone(), registry, skin, animations })
    }

    pub fn animation(&self, name: &str) -> Option<&Arc<SkeletonAnimation>> {
        self.animations.iter().find(|animation| animation.name() == name)
    }

    /// A player sized by `config.max_bones`, already playing the first clip when there is one.
    pub fn player(&self, config: &AnimationConfig) -> AnimationPlayer {
        let mut player = AnimationPlayer::new(config.max_bones);
        if let Some(first) = self.animations.first() {
            player.play(Arc::clone(first));
        }
        player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{AnimationSource, SkinBoneSource, SourceChannel, SourceNode};
    use glam::{Mat4, Vec3};

    fn imported() -> ImportedModel {
        let root = SourceNode::new("hips", Mat4::IDENTITY).with_child(SourceNode::new("tail", Mat4::IDENTITY));
        ImportedModel {
            name: "lizard".to_string(),
            vertex_count: 1,
            skin: vec![SkinBoneSource {
                name: "hips".to_string(),
                offset: Mat4::from_translation(Vec3::NEG_Y),
                weights: vec![(0, 1.0)],
            }],
            animations: vec![AnimationSource {
                name: "swish".to_string(),
                duration: 2.0,
                ticks_per_second: 1.0,
                root: Some(root),
                channels: vec![SourceChannel::rest("tail"), SourceChannel::rest("hips")],
            }],
        }
    }

    #[test]
    fn skin_and_animation_share_ids() -> Result<()> {
        let model = SkinnedModel::from_import(&imported(), &AnimationConfig::default())?;
        assert_eq!(model.registry.get("hips").map(|info| info.id), Some(0));
        assert_eq!(model.registry.get("tail").map(|info| info.id), Some(1));
        assert_eq!(model.skin.vertices[0].bone_ids[0], 0);
        let swish = model.animation("swish").expect("clip");
        assert_eq!(swish.find_track("hips").map(|track| track.id), Some(0));
        assert_eq!(swish.bone_info("hips").map(|info| info.offset), Some(Mat4::from_translation(Vec3::NEG_Y)));
        assert!(model.animation("missing").is_none());
        Ok(())
    }

    #[test]
    fn player_starts_on_first_clip() -> Result<()> {
        let config = AnimationConfig { max_bones: 8, ..Default::default() };
        let model = SkinnedModel::from_import(&imported(), &config)?;
        let player = model.player(&config);
        assert_eq!(player.animation().map(|a| a.name().to_string()), Some("swish".to_string()));
        assert_eq!(player.final_bone_matrices().capacity(), 8);
        Ok(())
    }

    #[test]
    fn load_errors_carry_context() {
        let mut broken = imported();
        broken.animations[0].duration = 0.0;
        let err = SkinnedModel::from_import(&broken, &AnimationConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid animation 'swish'"), "got {err}");
        assert!(format!("{err:?}").contains("degenerate duration"));
    }
}

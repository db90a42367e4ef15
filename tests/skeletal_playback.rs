use anyhow::{Context, Result};
use bone_animator::config::AnimationConfig;
use bone_animator::source::{AnimationSource, SourceChannel, SourceKey, SourceNode};
use bone_animator::{AnimationPlayer, BoneIndexRegistry, SkeletonAnimation, SkinnedModel};
use glam::{Mat4, Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::path::Path;
use std::sync::Arc;

fn approx_mat4(actual: Mat4, expected: Mat4) {
    assert!(actual.abs_diff_eq(expected, 1e-4), "expected {expected:?}, got {actual:?}");
}

fn approx_vec3(actual: Vec3, expected: Vec3) {
    assert!((actual - expected).length() < 1e-4, "expected {expected:?}, got {actual:?}");
}

#[test]
fn child_rotation_track_reaches_half_turn_midway() -> Result<()> {
    let mut registry = BoneIndexRegistry::new();
    let mut child = SourceChannel::rest("child");
    child.rotations =
        vec![SourceKey::new(0.0, Quat::IDENTITY), SourceKey::new(10.0, Quat::from_rotation_y(FRAC_PI_2))];
    let source = AnimationSource {
        name: "turn".to_string(),
        duration: 10.0,
        ticks_per_second: 1.0,
        root: Some(SourceNode::new("root", Mat4::IDENTITY).with_child(SourceNode::new("child", Mat4::IDENTITY))),
        channels: vec![child],
    };
    let animation = SkeletonAnimation::from_source(&source, &mut registry, &AnimationConfig::default())?;
    assert!(animation.find_track("root").is_none());
    let child_id = animation.bone_info("child").context("child bone info")?.id;

    let mut player = AnimationPlayer::default();
    player.play(Arc::new(animation));
    player.update(5.0);

    let child_matrix = *player.final_bone_matrices().get(child_id).context("child slot")?;
    approx_mat4(child_matrix, Mat4::from_rotation_y(FRAC_PI_4));
    Ok(())
}

#[test]
fn turntable_fixture_spins_base_and_carries_arm() -> Result<()> {
    let path = Path::new("fixtures/models/turntable.json");
    anyhow::ensure!(path.exists(), "Fixture missing at {}", path.display());
    let config = AnimationConfig::default();
    let model = SkinnedModel::load(path, &config).with_context(|| format!("Failed to load {}", path.display()))?;

    assert_eq!(model.registry.len(), 2);
    let base_id = model.registry.get("base").context("base registered")?.id;
    let arm_id = model.registry.get("arm").context("arm registered")?.id;
    assert_eq!((base_id, arm_id), (0, 1));
    assert_eq!(model.skin.vertices[1].bone_ids, [0, 1, -1, -1]);
    assert!(model.animations.iter().all(|clip| clip.unskinned_bones().is_empty()));

    let mut player = model.player(&config);
    assert_eq!(player.animation().map(|clip| clip.name().to_string()).as_deref(), Some("spin"));
    player.update(5.0);

    let stats = player.last_update_stats();
    assert_eq!(stats.nodes_visited, 3);
    assert_eq!(stats.bones_written, 2);
    assert_eq!(stats.tracks_evaluated, 1);

    let palette = player.final_bone_matrices();
    approx_mat4(*palette.get(base_id).context("base slot")?, Mat4::from_rotation_y(FRAC_PI_4));
    // arm offset cancels its bind translation, so the arm skins with the base rotation alone
    approx_mat4(*palette.get(arm_id).context("arm slot")?, Mat4::from_rotation_y(FRAC_PI_4));

    let tip = palette.get(arm_id).context("arm slot")?.transform_point3(Vec3::new(1.0, 1.0, 0.0));
    approx_vec3(tip, Vec3::new(FRAC_PI_4.cos(), 1.0, -FRAC_PI_4.sin()));
    Ok(())
}

#[test]
fn switching_clips_restarts_time() -> Result<()> {
    let config = AnimationConfig::default();
    let model = SkinnedModel::load("fixtures/models/turntable.json", &config)?;
    let lift = Arc::clone(model.animation("lift").context("lift clip")?);
    let arm_id = model.registry.get("arm").context("arm registered")?.id;

    let mut player = model.player(&config);
    player.update(3.0);
    assert!((player.current_time() - 3.0).abs() < 1e-5);

    player.play(lift);
    assert_eq!(player.current_time(), 0.0);
    // 2 ticks per second: one second lands on the peak key
    player.update(1.0);
    let arm = *player.final_bone_matrices().get(arm_id).context("arm slot")?;
    approx_vec3(arm.transform_point3(Vec3::ZERO), Vec3::new(0.0, 1.0, 0.0));
    approx_vec3(arm.transform_point3(Vec3::new(0.0, 1.0, 0.0)), Vec3::new(0.0, 2.0, 0.0));

    // 2 + 3 ticks wraps past the 4 tick duration
    player.update(1.5);
    assert!((player.current_time() - 1.0).abs() < 1e-5);
    Ok(())
}

#[test]
fn split_and_single_updates_agree_on_pose() -> Result<()> {
    let config = AnimationConfig::default();
    let model = SkinnedModel::load("fixtures/models/turntable.json", &config)?;

    let mut split = model.player(&config);
    split.seek(8.0);
    for dt in [1.0, 1.0, 5.0] {
        split.update(dt);
    }
    let mut single = model.player(&config);
    single.seek(8.0);
    single.update(7.0);

    assert!((split.current_time() - 5.0).abs() < 1e-5);
    assert!((single.current_time() - split.current_time()).abs() < 1e-5);
    for (a, b) in split.final_bone_matrices().as_slice().iter().zip(single.final_bone_matrices().as_slice()) {
        approx_mat4(*a, *b);
    }
    Ok(())
}

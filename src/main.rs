use anyhow::{anyhow, Context, Result};
use bone_animator::cli::CliOverrides;
use bone_animator::config::AppConfig;
use bone_animator::SkinnedModel;
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(cli) {
        eprintln!("Application error: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: CliOverrides) -> Result<()> {
    let mut config = AppConfig::load_or_default(cli.config_path());
    let overrides = cli.into_config_overrides();
    if !overrides.is_empty() {
        info!("[cli] overriding {}", overrides.applied_fields().join(", "));
    }
    config.apply_overrides(&overrides);

    let model_path = config.playback.model.clone().ok_or_else(|| anyhow!("No model given; pass --model <path>"))?;
    let model = SkinnedModel::load(&model_path, &config.animation)?;

    let mut player = model.player(&config.animation);
    if let Some(clip) = config.playback.clip.as_deref() {
        let animation = model
            .animation(clip)
            .with_context(|| format!("Clip '{clip}' not found in {}", model_path.display()))?;
        player.play(Arc::clone(animation));
    }
    let Some(animation) = player.animation().cloned() else {
        warn!("[player] '{}' has no animations; nothing to play.", model.name);
        return Ok(());
    };

    let fps = config.playback.fps.max(1.0);
    let frames = (config.playback.seconds.max(0.0) * fps).round() as u32;
    let dt = 1.0 / fps;
    for _ in 0..frames {
        player.update(dt);
    }

    let stats = player.last_update_stats();
    let palette: Vec<serde_json::Value> = model
        .registry
        .names_by_id()
        .iter()
        .enumerate()
        .filter_map(|(id, name)| {
            player
                .final_bone_matrices()
                .get(id as u32)
                .map(|matrix| json!({ "id": id, "bone": name.as_ref(), "matrix": matrix.to_cols_array() }))
        })
        .collect();
    let summary = json!({
        "model": model.name,
        "clip": animation.name(),
        "frames": frames,
        "time_ticks": player.current_time(),
        "stats": {
            "nodes_visited": stats.nodes_visited,
            "tracks_evaluated": stats.tracks_evaluated,
            "bones_written": stats.bones_written,
            "bones_skipped": stats.bones_skipped,
        },
        "palette": palette,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

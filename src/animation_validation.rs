use crate::animation::SkeletonAnimation;
use crate::assets::{self, ImportedModel, ModelFormat};
use crate::bone_registry::BoneIndexRegistry;
use crate::config::AnimationConfig;
use crate::skin::build_skin;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationValidationSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for AnimationValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationValidationSeverity::Info => write!(f, "info"),
            AnimationValidationSeverity::Warning => write!(f, "warning"),
            AnimationValidationSeverity::Error => write!(f, "error"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnimationValidationEvent {
    pub severity: AnimationValidationSeverity,
    pub path: PathBuf,
    pub message: String,
}

/// Per-clip figures gathered while validating, suitable for JSON reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClipStats {
    pub clip: String,
    pub duration_seconds: f32,
    pub ticks_per_second: f32,
    pub tracks: usize,
    pub nodes: usize,
    pub depth: usize,
    /// Palette slots the clip writes to (highest bone id + 1).
    pub palette_slots: usize,
    pub palette_capacity: usize,
    pub unskinned_bones: Vec<String>,
}

impl ClipStats {
    pub fn from_animation(animation: &SkeletonAnimation, config: &AnimationConfig) -> Self {
        Self {
            clip: animation.name().to_string(),
            duration_seconds: animation.duration_seconds(),
            ticks_per_second: animation.ticks_per_second(),
            tracks: animation.track_count(),
            nodes: animation.root().node_count(),
            depth: animation.root().depth(),
            palette_slots: animation.bone_count(),
            palette_capacity: config.max_bones,
            unskinned_bones: animation.unskinned_bones().iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn fits_palette(&self) -> bool {
        self.palette_slots <= self.palette_capacity
    }
}

/// Everything learned about one model file: validation events plus stats for each clip that built.
#[derive(Clone, Debug, Default)]
pub struct ModelReport {
    pub events: Vec<AnimationValidationEvent>,
    pub skin_bones: usize,
    pub vertices: usize,
    pub overflowed_influences: usize,
    pub clips: Vec<ClipStats>,
}

impl ModelReport {
    pub fn count(&self, severity: AnimationValidationSeverity) -> usize {
        self.events.iter().filter(|event| event.severity == severity).count()
    }
}

pub struct AnimationValidator;

impl AnimationValidator {
    /// Validate the model at `path` and return any validation events.
    pub fn validate_path(path: &Path, config: &AnimationConfig) -> Vec<AnimationValidationEvent> {
        Self::inspect_path(path, config).events
    }

    pub fn validate_model(
        path: &Path,
        model: &ImportedModel,
        config: &AnimationConfig,
    ) -> Vec<AnimationValidationEvent> {
        Self::inspect_model(path, model, config).events
    }

    pub fn inspect_path(path: &Path, config: &AnimationConfig) -> ModelReport {
        let single = |severity, message: &str| ModelReport {
            events: vec![Self::event(path, severity, message)],
            ..ModelReport::default()
        };
        if !path.exists() {
            return single(AnimationValidationSeverity::Warning, "File not found (it may have been removed).");
        }
        if ModelFormat::from_path(path).is_none() {
            return single(AnimationValidationSeverity::Info, "No validators available for this file type.");
        }
        match assets::load_model(path) {
            Ok(model) => Self::inspect_model(path, &model, config),
            Err(err) => single(AnimationValidationSeverity::Error, &format!("{err:#}")),
        }
    }

    /// Builds each clip against its own copy of the skin registry so one broken clip does not hide
    /// problems in the others.
    pub fn inspect_model(path: &Path, model: &ImportedModel, config: &AnimationConfig) -> ModelReport {
        let mut report =
            ModelReport { skin_bones: model.skin.len(), vertices: model.vertex_count, ..Default::default() };
        let mut skin_registry = BoneIndexRegistry::new();
        match build_skin(model.vertex_count, &model.skin, &mut skin_registry) {
            Ok(binding) => report.overflowed_influences = binding.overflowed_influences,
            Err(err) => {
                report.events.push(Self::event(path, AnimationValidationSeverity::Error, format!("Skin: {err}")));
                return report;
            }
        }
        if model.skin.is_empty() {
            report.events.push(Self::event(
                path,
                AnimationValidationSeverity::Warning,
                "Model has no skin bones; every animated bone will use an identity offset.",
            ));
        }
        if report.overflowed_influences > 0 {
            report.events.push(Self::event(
                path,
                AnimationValidationSeverity::Warning,
                format!("{} vertex influences were dropped past 4 bones per vertex.", report.overflowed_influences),
            ));
        }
        if model.animations.is_empty() {
            report.events.push(Self::event(
                path,
                AnimationValidationSeverity::Warning,
                format!("Model '{}' does not define any animations.", model.name),
            ));
        }

        for source in &model.animations {
            let mut registry = skin_registry.clone();
            match SkeletonAnimation::from_source(source, &mut registry, config) {
                Ok(animation) => {
                    report.events.extend(Self::clip_success_events(path, &animation, config));
                    report.clips.push(ClipStats::from_animation(&animation, config));
                }
                Err(err) => report.events.push(Self::event(
                    path,
                    AnimationValidationSeverity::Error,
                    format!("Clip '{}': {err}", source.name),
                )),
            }
        }
        report
    }

    fn clip_success_events(
        path: &Path,
        animation: &SkeletonAnimation,
        config: &AnimationConfig,
    ) -> Vec<AnimationValidationEvent> {
        let mut events = Vec::new();
        if !animation.unskinned_bones().is_empty() {
            let names: Vec<&str> = animation.unskinned_bones().iter().map(|name| name.as_ref()).collect();
            events.push(Self::event(
                path,
                AnimationValidationSeverity::Warning,
                format!(
                    "Clip '{}' animates bones without skin data (identity offsets): {}",
                    animation.name(),
                    names.join(", ")
                ),
            ));
        }
        if animation.bone_count() > config.max_bones {
            events.push(Self::event(
                path,
                AnimationValidationSeverity::Warning,
                format!(
                    "Clip '{}' needs {} palette slots but only {} are configured.",
                    animation.name(),
                    animation.bone_count(),
                    config.max_bones
                ),
            ));
        }
        let orphaned = animation.tracks().filter(|track| animation.root().find(&track.name).is_none()).count();
        if orphaned > 0 {
            events.push(Self::event(
                path,
                AnimationValidationSeverity::Warning,
                format!("Clip '{}' has {orphaned} tracks for nodes missing from the hierarchy.", animation.name()),
            ));
        }
        events.push(Self::event(
            path,
            AnimationValidationSeverity::Info,
            format!(
                "Clip '{}' OK: duration {:.3} ticks at {:.1} ticks/s, {} tracks, {} nodes",
                animation.name(),
                animation.duration(),
                animation.ticks_per_second(),
                animation.track_count(),
                animation.root().node_count()
            ),
        ));
        events
    }

    fn event(path: &Path, severity: AnimationValidationSeverity, message: impl Into<String>) -> AnimationValidationEvent {
        AnimationValidationEvent { severity, path: path.to_path_buf(), message: message.into() }
    }
}

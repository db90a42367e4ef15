use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Palette slots reserved by default; matches the size of the skinning shader's uniform array.
pub const DEFAULT_MAX_BONES: usize = 100;
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 256;
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

#[derive(Debug, Clone, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "AnimationConfig::default_max_bones")]
    pub max_bones: usize,
    #[serde(default = "AnimationConfig::default_max_hierarchy_depth")]
    pub max_hierarchy_depth: usize,
    #[serde(default = "AnimationConfig::default_ticks_per_second")]
    pub default_ticks_per_second: f32,
    #[serde(default = "AnimationConfig::default_warn_on_identity_offset")]
    pub warn_on_identity_offset: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "PlaybackConfig::default_fps")]
    pub fps: f32,
    #[serde(default = "PlaybackConfig::default_seconds")]
    pub seconds: f32,
    #[serde(default)]
    pub clip: Option<String>,
    #[serde(default)]
    pub model: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub model: Option<PathBuf>,
    pub clip: Option<String>,
    pub fps: Option<f32>,
    pub seconds: Option<f32>,
    pub max_bones: Option<usize>,
}

impl AnimationConfig {
    const fn default_max_bones() -> usize {
        DEFAULT_MAX_BONES
    }

    const fn default_max_hierarchy_depth() -> usize {
        DEFAULT_MAX_HIERARCHY_DEPTH
    }

    const fn default_ticks_per_second() -> f32 {
        DEFAULT_TICKS_PER_SECOND
    }

    const fn default_warn_on_identity_offset() -> bool {
        true
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            max_bones: Self::default_max_bones(),
            max_hierarchy_depth: Self::default_max_hierarchy_depth(),
            default_ticks_per_second: Self::default_ticks_per_second(),
            warn_on_identity_offset: Self::default_warn_on_identity_offset(),
        }
    }
}

impl PlaybackConfig {
    const fn default_fps() -> f32 {
        60.0
    }

    const fn default_seconds() -> f32 {
        2.0
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { fps: Self::default_fps(), seconds: Self::default_seconds(), clip: None, model: None }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("[config] {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(model) = &overrides.model {
            self.playback.model = Some(model.clone());
        }
        if let Some(clip) = &overrides.clip {
            self.playback.clip = Some(clip.clone());
        }
        if let Some(fps) = overrides.fps {
            self.playback.fps = fps;
        }
        if let Some(seconds) = overrides.seconds {
            self.playback.seconds = seconds;
        }
        if let Some(max_bones) = overrides.max_bones {
            self.animation.max_bones = max_bones;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.clip.is_none()
            && self.fps.is_none()
            && self.seconds.is_none()
            && self.max_bones.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.model.is_some() {
            fields.push("model");
        }
        if self.clip.is_some() {
            fields.push("clip");
        }
        if self.fps.is_some() {
            fields.push("fps");
        }
        if self.seconds.is_some() {
            fields.push("seconds");
        }
        if self.max_bones.is_some() {
            fields.push("max_bones");
        }
        fields
    }
}

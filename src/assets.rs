use crate::source::{AnimationSource, SkinBoneSource};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub mod skeletal;

/// Everything the animation core needs from an imported model file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImportedModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vertex_count: usize,
    #[serde(default)]
    pub skin: Vec<SkinBoneSource>,
    #[serde(default)]
    pub animations: Vec<AnimationSource>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Gltf,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Some(ModelFormat::Json),
            Some("gltf") | Some("glb") => Some(ModelFormat::Gltf),
            _ => None,
        }
    }
}

pub fn load_model(path: impl AsRef<Path>) -> Result<ImportedModel> {
    let path = path.as_ref();
    match ModelFormat::from_path(path) {
        Some(ModelFormat::Json) => load_model_json(path),
        Some(ModelFormat::Gltf) => skeletal::load_model_from_gltf(path),
        None => Err(anyhow!("Unsupported model format '{}'", path.display())),
    }
}

pub fn load_model_json(path: impl AsRef<Path>) -> Result<ImportedModel> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("Failed to read model file {}", path.display()))?;
    let fallback_name = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("model");
    parse_model_json(&bytes, fallback_name).with_context(|| format!("Failed to parse model file {}", path.display()))
}

pub fn parse_model_json(bytes: &[u8], fallback_name: &str) -> Result<ImportedModel> {
    let mut model: ImportedModel = serde_json::from_slice(bytes)?;
    if model.name.is_empty() {
        model.name = fallback_name.to_string();
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Quat, Vec3};

    #[test]
    fn parses_glam_encoded_values() -> Result<()> {
        let json = br#"{
            "vertex_count": 2,
            "skin": [{ "name": "hips", "weights": [[0, 1.0], [1, 0.5]] }],
            "animations": [{
                "name": "idle",
                "duration": 4.0,
                "ticks_per_second": 2.0,
                "root": {
                    "name": "hips",
                    "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,2,0,1],
                    "children": [{ "name": "spine" }]
                },
                "channels": [{
                    "bone": "spine",
                    "positions": [{ "time": 0.0, "value": [0, 1, 0] }],
                    "rotations": [{ "time": 0.0, "value": [0, 0, 0, 1] }],
                    "scales": [{ "time": 0.0, "value": [1, 1, 1] }]
                }]
            }]
        }"#;
        let model = parse_model_json(json, "fallback")?;
        assert_eq!(model.name, "fallback");
        assert_eq!(model.skin[0].offset, Mat4::IDENTITY);
        assert_eq!(model.skin[0].weights, vec![(0, 1.0), (1, 0.5)]);
        let animation = &model.animations[0];
        let root = animation.root.as_ref().expect("root");
        assert_eq!(root.transform, Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(root.children[0].transform, Mat4::IDENTITY);
        assert_eq!(animation.channels[0].rotations[0].value, Quat::IDENTITY);
        assert_eq!(animation.channels[0].positions[0].value, Vec3::Y);
        Ok(())
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_model("rig.fbx").unwrap_err();
        assert!(err.to_string().contains("Unsupported model format"));
        assert_eq!(ModelFormat::from_path(Path::new("a/b.GLB")), Some(ModelFormat::Gltf));
    }
}

use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/player.json";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    clip: Option<String>,
    fps: Option<f32>,
    seconds: Option<f32>,
    max_bones: Option<usize>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Flags take the form --name <value>.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config = Some(PathBuf::from(value)),
                "model" => overrides.model = Some(PathBuf::from(value)),
                "clip" => overrides.clip = Some(value),
                "fps" => {
                    let fps = value.parse::<f32>().with_context(|| format!("Invalid fps '{value}'"))?;
                    if !(fps > 0.0) {
                        bail!("fps must be positive, got {fps}");
                    }
                    overrides.fps = Some(fps);
                }
                "seconds" => {
                    overrides.seconds =
                        Some(value.parse::<f32>().with_context(|| format!("Invalid seconds '{value}'"))?);
                }
                "max-bones" => {
                    overrides.max_bones =
                        Some(value.parse::<usize>().with_context(|| format!("Invalid max-bones '{value}'"))?);
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --model, --clip, --fps, --seconds, --max-bones."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides {
            model: self.model,
            clip: self.clip,
            fps: self.fps,
            seconds: self.seconds,
            max_bones: self.max_bones,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_playback_flags() {
        let args = ["app", "--model", "rigs/fox.gltf", "--clip", "run", "--fps", "30", "--max-bones", "64"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.config_path(), PathBuf::from(DEFAULT_CONFIG_PATH));
        let applied = overrides.into_config_overrides();
        assert_eq!(applied.model, Some(PathBuf::from("rigs/fox.gltf")));
        assert_eq!(applied.clip.as_deref(), Some("run"));
        assert_eq!(applied.fps, Some(30.0));
        assert_eq!(applied.max_bones, Some(64));
        assert!(applied.seconds.is_none());
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["app", "--seconds", "1", "--seconds", "4.5", "--config", "alt.json"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.config_path(), PathBuf::from("alt.json"));
        assert_eq!(overrides.into_config_overrides().seconds, Some(4.5));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["app", "--fps"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags_and_bad_fps() {
        let err = CliOverrides::parse(["app", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
        assert!(CliOverrides::parse(["app", "--fps", "0"]).is_err());
        assert!(CliOverrides::parse(["app", "--max-bones", "-3"]).is_err());
    }
}

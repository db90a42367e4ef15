use anyhow::{bail, Context, Result};
use bone_animator::animation_validation::{AnimationValidationSeverity, AnimationValidator, ClipStats, ModelReport};
use bone_animator::assets::ModelFormat;
use bone_animator::config::{AnimationConfig, AppConfig};
use log::debug;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

const USAGE: &str = "\
Usage: animation_check [options] <model-or-dir>...

Loads every .json/.gltf/.glb model, builds each clip against the model's skin
and reports problems the player would hit at runtime.

Options:
  --config <file>     read animation limits from a player config
  --max-bones <n>     palette capacity to check clips against
  --report-stats      print one JSON line per model with per-clip stats
  --fail-on-warn      exit with status 2 on warnings as well as errors
";

#[derive(Debug, Default, PartialEq)]
struct CheckArgs {
    config: Option<PathBuf>,
    max_bones: Option<usize>,
    report_stats: bool,
    fail_on_warn: bool,
    help: bool,
    inputs: Vec<PathBuf>,
}

impl CheckArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = CheckArgs::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(args.next().context("--config needs a path")?)),
                "--max-bones" => {
                    let value = args.next().context("--max-bones needs a number")?;
                    parsed.max_bones =
                        Some(value.parse().with_context(|| format!("Invalid --max-bones '{value}'"))?);
                }
                "--report-stats" => parsed.report_stats = true,
                "--fail-on-warn" => parsed.fail_on_warn = true,
                "-h" | "--help" => parsed.help = true,
                flag if flag.starts_with("--") => bail!("Unknown flag '{flag}'"),
                _ => parsed.inputs.push(PathBuf::from(arg.as_str())),
            }
        }
        Ok(parsed)
    }

    fn animation_config(&self) -> Result<AnimationConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?.animation,
            None => AnimationConfig::default(),
        };
        if let Some(max_bones) = self.max_bones {
            config.max_bones = max_bones;
        }
        Ok(config)
    }
}

/// Totals across every checked model.
#[derive(Debug, Default)]
struct Tally {
    models: usize,
    clips: usize,
    warnings: usize,
    errors: usize,
    widest_palette: usize,
}

impl Tally {
    fn absorb(&mut self, report: &ModelReport) {
        self.models += 1;
        self.clips += report.clips.len();
        self.warnings += report.count(AnimationValidationSeverity::Warning);
        self.errors += report.count(AnimationValidationSeverity::Error);
        let widest = report.clips.iter().map(|clip| clip.palette_slots).max().unwrap_or(0);
        self.widest_palette = self.widest_palette.max(widest);
    }

    fn failed(&self, fail_on_warn: bool) -> bool {
        self.errors > 0 || (fail_on_warn && self.warnings > 0)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(std::env::args().skip(1)) {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(err) => {
            eprintln!("animation_check: {err:?}");
            process::exit(1);
        }
    }
}

/// Returns whether the run passed.
fn run<I: IntoIterator<Item = String>>(args: I) -> Result<bool> {
    let args = CheckArgs::parse(args)?;
    if args.help {
        eprint!("{USAGE}");
        return Ok(true);
    }
    let config = args.animation_config()?;
    let models = gather_models(&args.inputs)?;
    if models.is_empty() {
        bail!("No model files found; pass at least one .json/.gltf/.glb file or directory.\n\n{USAGE}");
    }

    let mut tally = Tally::default();
    for path in &models {
        let report = AnimationValidator::inspect_path(path, &config);
        print_report(path, &report);
        if args.report_stats {
            println!("{}", stats_line(path, &report));
        }
        tally.absorb(&report);
    }

    println!(
        "{} models, {} clips: {} warnings, {} errors (widest palette {} of {} slots)",
        tally.models, tally.clips, tally.warnings, tally.errors, tally.widest_palette, config.max_bones
    );
    if args.report_stats {
        println!(
            "{}",
            json!({
                "models": tally.models,
                "clips": tally.clips,
                "warnings": tally.warnings,
                "errors": tally.errors,
                "widest_palette": tally.widest_palette,
                "palette_capacity": config.max_bones,
            })
        );
    }
    Ok(!tally.failed(args.fail_on_warn))
}

/// Expands directories (depth-first) into the model files they contain. Output is sorted and free of duplicates.
fn gather_models(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut pending: Vec<PathBuf> = inputs.to_vec();
    let mut models = Vec::new();
    while let Some(path) = pending.pop() {
        if path.is_dir() {
            for entry in fs::read_dir(&path).with_context(|| format!("Failed to list {}", path.display()))? {
                pending.push(entry?.path());
            }
        } else if !path.exists() {
            bail!("{} does not exist", path.display());
        } else if ModelFormat::from_path(&path).is_some() {
            models.push(fs::canonicalize(&path).unwrap_or(path));
        } else {
            debug!("[animation_check] ignoring {}", path.display());
        }
    }
    models.sort();
    models.dedup();
    Ok(models)
}

fn print_report(path: &Path, report: &ModelReport) {
    if report.count(AnimationValidationSeverity::Warning) + report.count(AnimationValidationSeverity::Error) == 0 {
        println!("[ok] {} ({} clips)", path.display(), report.clips.len());
    }
    for event in &report.events {
        if event.severity == AnimationValidationSeverity::Info {
            continue;
        }
        println!("[{}] {}: {}", event.severity, path.display(), event.message);
    }
    for clip in report.clips.iter().filter(|clip| !clip.fits_palette()) {
        println!(
            "  clip '{}' writes {} palette slots; {} will be skipped",
            clip.clip,
            clip.palette_slots,
            clip.palette_slots - clip.palette_capacity
        );
    }
}

fn stats_line(path: &Path, report: &ModelReport) -> serde_json::Value {
    json!({
        "model": path.display().to_string(),
        "skin_bones": report.skin_bones,
        "vertices": report.vertices,
        "overflowed_influences": report.overflowed_influences,
        "clips": report.clips.iter().collect::<Vec<&ClipStats>>(),
    })
}

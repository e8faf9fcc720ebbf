use std::path::PathBuf;

use rubble_core::config::DrawMode;
use thiserror::Error;

use crate::scenes::{standard_scenes, SceneConfig};

pub const USAGE: &str = "\
Usage: bench-runner [OPTIONS]
  --scene <name>                 Run only this scene (repeatable; default: all)
  --blocks <n>                   Override the block count of every selected scene
  --draw-mode <batched|immediate>
                                 Override the draw mode of every selected scene
  --seed <n>                     Override the layout and contact seed
  --ticks <n>                    Ticks per scene (default: 120)
  --gpu                          Use a wgpu device instead of the headless renderer
  --baseline <path>              Load baseline JSON for comparison
  --output <path>                Save current results as JSON baseline
  --regression-threshold <pct>   Timing regression threshold percentage (default: 10)";

#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: &'static str, value: String },
    #[error("unknown scene '{0}'")]
    UnknownScene(String),
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Run(BenchArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchArgs {
    pub scenes: Vec<String>,
    pub block_count: Option<u32>,
    pub draw_mode: Option<DrawMode>,
    pub seed: Option<u32>,
    pub tick_count: u32,
    pub gpu: bool,
    pub baseline: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub regression_threshold: f64,
}

impl Default for BenchArgs {
    fn default() -> Self {
        Self {
            scenes: Vec::new(),
            block_count: None,
            draw_mode: None,
            seed: None,
            tick_count: 120,
            gpu: false,
            baseline: None,
            output: None,
            regression_threshold: 10.0,
        }
    }
}

/// Parse command-line arguments, program name excluded.
pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = BenchArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scene" => parsed.scenes.push(value(&mut args, "--scene")?),
            "--blocks" => parsed.block_count = Some(number(&mut args, "--blocks")?),
            "--draw-mode" => {
                let raw = value(&mut args, "--draw-mode")?;
                parsed.draw_mode = Some(match raw.as_str() {
                    "batched" => DrawMode::Batched,
                    "immediate" => DrawMode::Immediate,
                    _ => {
                        return Err(CliError::InvalidValue {
                            flag: "--draw-mode",
                            value: raw,
                        })
                    }
                });
            }
            "--seed" => parsed.seed = Some(number(&mut args, "--seed")?),
            "--ticks" => parsed.tick_count = number(&mut args, "--ticks")?,
            "--gpu" => parsed.gpu = true,
            "--baseline" => parsed.baseline = Some(value(&mut args, "--baseline")?.into()),
            "--output" => parsed.output = Some(value(&mut args, "--output")?.into()),
            "--regression-threshold" => {
                parsed.regression_threshold = number(&mut args, "--regression-threshold")?
            }
            "--help" | "-h" => return Ok(Command::Help),
            _ => return Err(CliError::UnknownArgument(arg)),
        }
    }
    Ok(Command::Run(parsed))
}

impl BenchArgs {
    /// Standard scenes filtered by `--scene`, in suite order, with the
    /// overrides applied.
    pub fn select_scenes(&self) -> Result<Vec<SceneConfig>, CliError> {
        let suite = standard_scenes();
        if let Some(unknown) = self
            .scenes
            .iter()
            .find(|name| !suite.iter().any(|s| &s.name == *name))
        {
            return Err(CliError::UnknownScene(unknown.clone()));
        }

        Ok(suite
            .into_iter()
            .filter(|s| self.scenes.is_empty() || self.scenes.contains(&s.name))
            .map(|scene| {
                let mut scene = match self.block_count {
                    Some(n) => scene.with_block_count(n),
                    None => scene,
                };
                if let Some(mode) = self.draw_mode {
                    scene.draw_mode = mode;
                }
                if let Some(seed) = self.seed {
                    scene.seed = seed;
                }
                scene
            })
            .collect())
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &'static str) -> Result<String, CliError> {
    args.next().ok_or(CliError::MissingValue(flag))
}

fn number<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, CliError> {
    let raw = value(args, flag)?;
    raw.parse()
        .map_err(|_| CliError::InvalidValue { flag, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, CliError> {
        parse_args(args.iter().map(|a| a.to_string()))
    }

    fn run_args(args: &[&str]) -> BenchArgs {
        match parse(args).expect("valid arguments") {
            Command::Run(a) => a,
            Command::Help => panic!("expected a run command"),
        }
    }

    #[test]
    fn test_defaults_run_whole_suite() {
        let args = run_args(&[]);
        assert_eq!(args, BenchArgs::default());
        assert_eq!(args.select_scenes().expect("suite").len(), standard_scenes().len());
    }

    #[test]
    fn test_scene_filter_and_overrides() {
        let args = run_args(&[
            "--scene", "10K", "--scene", "1K", "--blocks", "500", "--draw-mode", "immediate", "--seed", "7",
        ]);
        let scenes = args.select_scenes().expect("known scenes");
        let names: Vec<&str> = scenes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["1K@500", "10K@500"]);
        assert!(scenes.iter().all(|s| s.block_count == 500));
        assert!(scenes.iter().all(|s| s.draw_mode == DrawMode::Immediate));
        assert!(scenes.iter().all(|s| s.seed == 7));
    }

    #[test]
    fn test_unknown_scene_rejected() {
        let args = run_args(&["--scene", "2K"]);
        assert_eq!(args.select_scenes(), Err(CliError::UnknownScene("2K".into())));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert_eq!(parse(&["--ticks"]), Err(CliError::MissingValue("--ticks")));
        assert_eq!(
            parse(&["--blocks", "many"]),
            Err(CliError::InvalidValue {
                flag: "--blocks",
                value: "many".into()
            })
        );
        assert!(matches!(
            parse(&["--draw-mode", "wireframe"]),
            Err(CliError::InvalidValue { flag: "--draw-mode", .. })
        ));
        assert_eq!(parse(&["--fast"]), Err(CliError::UnknownArgument("--fast".into())));
    }

    #[test]
    fn test_help_and_flags() {
        assert_eq!(parse(&["--ticks", "5", "-h"]), Ok(Command::Help));
        let args = run_args(&["--gpu", "--output", "out.json", "--regression-threshold", "2.5"]);
        assert!(args.gpu);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert_eq!(args.regression_threshold, 2.5);
    }
}

/// Command line configuration
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, ValueEnum};
use glscene_core::starfield::DEFAULT_STAR_COUNT;
use glscene_core::{SceneConfig, SceneKind};

use crate::logging::LoggingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneArg {
    /// Axes, cube and sphere
    Shapes,
    /// Earth, moon and stars
    Earth,
}

impl From<SceneArg> for SceneKind {
    fn from(arg: SceneArg) -> Self {
        match arg {
            SceneArg::Shapes => SceneKind::Shapes,
            SceneArg::Earth => SceneKind::Earth,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "glscene-terminal", version, about = "Transform-stack demo scenes rendered as ASCII art")]
pub struct AppConfig {
    /// Scene to start with (Tab switches at runtime)
    #[arg(long, value_enum, default_value_t = SceneArg::Shapes)]
    pub scene: SceneArg,

    /// Target frames per second
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Number of stars in the Earth scene
    #[arg(long, default_value_t = DEFAULT_STAR_COUNT)]
    pub stars: usize,

    /// Seed for stars, clouds and lightning (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Icosphere subdivisions for the Earth
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=6))]
    pub detail: u32,

    /// Initial camera distance (greater than zero)
    #[arg(long, value_parser = parse_distance)]
    pub distance: Option<f32>,

    /// Log filter in env_logger syntax (defaults to RUST_LOG, then "warn")
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn scene_kind(&self) -> SceneKind {
        self.scene.into()
    }

    /// Scene settings for a terminal of `columns` x `rows` cells.
    pub fn scene_config(&self, columns: u16, rows: u16) -> SceneConfig {
        SceneConfig {
            seed: self.seed.unwrap_or_else(clock_seed),
            star_count: self.stars,
            earth_detail: self.detail,
            camera_distance: self.distance,
            viewport: cell_viewport(columns, rows),
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log_filter.clone(),
            log_file: self.log_file.clone(),
            ..LoggingConfig::default()
        }
    }
}

/// Terminal cells are roughly twice as tall as they are wide.
pub fn cell_viewport(columns: u16, rows: u16) -> (u32, u32) {
    (u32::from(columns), u32::from(rows) * 2)
}

/// A camera sitting on its target has no view direction.
fn parse_distance(value: &str) -> Result<f32, String> {
    let distance: f32 = value.parse().map_err(|err| format!("{err}"))?;
    if distance.is_finite() && distance > 0.0 {
        Ok(distance)
    } else {
        Err(format!("{distance} is not a positive distance"))
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::try_parse_from(["glscene-terminal"]).unwrap();
        assert_eq!(config.scene_kind(), SceneKind::Shapes);
        assert_eq!(config.fps, 30);
        assert_eq!(config.stars, DEFAULT_STAR_COUNT);
        assert_eq!(config.detail, 3);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_scene_config_from_flags() {
        let config = AppConfig::try_parse_from([
            "glscene-terminal",
            "--scene",
            "earth",
            "--stars",
            "120",
            "--seed",
            "9",
            "--distance",
            "6.5",
        ])
        .unwrap();
        let scene = config.scene_config(100, 30);
        assert_eq!(config.scene_kind(), SceneKind::Earth);
        assert_eq!(scene.seed, 9);
        assert_eq!(scene.star_count, 120);
        assert_eq!(scene.camera_distance, Some(6.5));
        assert_eq!(scene.viewport, (100, 60));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(AppConfig::try_parse_from(["glscene-terminal", "--fps", "0"]).is_err());
        assert!(AppConfig::try_parse_from(["glscene-terminal", "--detail", "9"]).is_err());
        assert!(AppConfig::try_parse_from(["glscene-terminal", "--scene", "mars"]).is_err());
    }

    #[test]
    fn test_distance_must_be_positive() {
        for bad in ["0", "-3", "inf", "NaN", "far"] {
            assert!(
                AppConfig::try_parse_from(["glscene-terminal", "--distance", bad]).is_err(),
                "accepted --distance {bad}"
            );
        }
        let config = AppConfig::try_parse_from(["glscene-terminal", "--distance", "0.5"]).unwrap();
        assert_eq!(config.distance, Some(0.5));
    }

    #[test]
    fn test_logging_config() {
        let config =
            AppConfig::try_parse_from(["glscene-terminal", "--log-filter", "debug", "--log-file", "out.log"])
                .unwrap();
        let logging = config.logging();
        assert_eq!(logging.env_filter.as_deref(), Some("debug"));
        assert_eq!(logging.log_file, Some(PathBuf::from("out.log")));
    }
}

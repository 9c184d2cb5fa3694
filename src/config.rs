use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{bounds::BoundsConfig, playback::PlaybackConfig};

pub const DEFAULT_PATH: &str = "config.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Track to load, overridden by `--input`.
    pub source: PathBuf,
    pub http_port: u16,

    pub playback: PlaybackConfig,

    // box shown when the track has no points at all
    pub fallback_bounds: BoundsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from("results.csv"),
            http_port: 8080,
            playback: PlaybackConfig::default(),
            fallback_bounds: BoundsConfig::default(),
        }
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path).context("Failed to read config")?;
    parse(&data)
}

/// Loads `path` if given, otherwise `config.toml` if it exists, otherwise the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load(path),
        None if Path::new(DEFAULT_PATH).exists() => load(Path::new(DEFAULT_PATH)),
        None => Ok(Config::default()),
    }
}

fn parse(data: &str) -> Result<Config> {
    let config: Config = toml::from_str(data).context("Failed to parse config")?;
    config
        .playback
        .interval(config.playback.default_rate)
        .context("Invalid playback.default_rate")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.source, PathBuf::from("results.csv"));
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.playback.base_interval_ms, 1000);
        assert_eq!(config.playback.min_interval_ms, 100);
        assert_eq!(config.playback.default_rate, 1.0);
        assert_eq!(config.fallback_bounds.min_lat, 49.9);
        assert_eq!(config.fallback_bounds.max_lng, 36.4);
    }

    #[test]
    fn partial() {
        let config = parse(
            r#"
            source = "track.csv"

            [playback]
            min_interval_ms = 50
            default_rate = 4

            [fallback_bounds]
            min_lat = 1.0
            min_lng = 2.0
            max_lat = 3.0
            max_lng = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.source, PathBuf::from("track.csv"));
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.playback.base_interval_ms, 1000);
        assert_eq!(config.playback.min_interval_ms, 50);
        assert_eq!(config.playback.default_rate, 4.0);
        assert_eq!(config.fallback_bounds.max_lng, 4.0);
    }

    #[test]
    fn invalid() {
        assert!(parse("http_port = \"eighty\"").is_err());
        assert!(parse("[playback]\ndefault_rate = 0.0").is_err());
        assert!(parse("[fallback_bounds]\nmin_lat = 1.0").is_err());
        assert!(load(Path::new("/nonexistent/config.toml")).is_err());
    }
}

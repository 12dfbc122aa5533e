use std::collections::BTreeSet;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::elements::ElementFields;
use crate::frames::StationPosition;
use crate::predict::PassFinder;
use crate::tracker::{AntimeridianSplit, DEFAULT_FOOTPRINT_RESOLUTION_DEG};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid station coordinates: {0}")]
    Station(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub predict: PredictConfig,
    #[serde(default)]
    pub satellites: Vec<SatelliteEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    /// `"lat, lon"` in decimal degrees
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

impl StationConfig {
    pub fn position(&self) -> Result<StationPosition, ConfigError> {
        StationPosition::from_coordinates(&self.coordinates, Some(self.altitude_m))
            .ok_or_else(|| ConfigError::Station(self.coordinates.clone()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    pub horizon_hours: u32,
    pub min_elevation_deg: f64,
    #[serde(deserialize_with = "deserialize_duration")]
    pub coarse_step: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub tolerance: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub track_step: Duration,
    pub antimeridian_threshold_deg: f64,
    pub footprint_resolution_deg: f64,
}

impl Default for PredictConfig {
    fn default() -> Self {
        let finder = PassFinder::default();
        Self {
            horizon_hours: 24,
            min_elevation_deg: 0.0,
            coarse_step: finder.coarse_step,
            tolerance: finder.tolerance,
            track_step: Duration::seconds(30),
            antimeridian_threshold_deg: AntimeridianSplit::default().threshold_deg,
            footprint_resolution_deg: DEFAULT_FOOTPRINT_RESOLUTION_DEG,
        }
    }
}

impl PredictConfig {
    pub fn pass_finder(&self) -> PassFinder {
        PassFinder {
            coarse_step: self.coarse_step,
            tolerance: self.tolerance,
        }
    }

    pub fn antimeridian(&self) -> AntimeridianSplit {
        AntimeridianSplit {
            threshold_deg: self.antimeridian_threshold_deg,
        }
    }
}

/// One catalog entry: either TLE text (two or three lines) or OMM-style element fields.
#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteEntry {
    pub tle: Option<String>,
    pub elements: Option<ElementFields>,
    #[serde(default)]
    pub modes: BTreeSet<String>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.station.position()?;
        Ok(config)
    }
}

/// Human-readable duration such as `60s`, `100ms` or `1h 30m`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(serde::de::Error::custom)
}

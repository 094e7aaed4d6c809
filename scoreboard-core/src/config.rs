//! Scoreboard configuration loaded from an optional JSON file.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::progress::LevelDistances;
use crate::record::PlayerId;
use crate::store::DEFAULT_FILE_NAME;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("top_n must be at least 1")]
    ZeroTopN,
    #[error("end distance for level {level} must be positive (got {value:.2})")]
    LevelDistance { level: u32, value: f64 },
    #[error("fallback end distance must be positive (got {0:.2})")]
    FallbackDistance(f64),
}

/// Where the scoreboard lives and how standings are presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardConfig {
    #[serde(default = "ScoreboardConfig::default_file")]
    pub file: PathBuf,
    /// Rows shown by display front-ends.
    #[serde(default = "ScoreboardConfig::default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub level_distances: LevelDistances,
    /// Sentinel or test players hidden from displayed standings.
    #[serde(default)]
    pub excluded_players: Vec<PlayerId>,
}

impl ScoreboardConfig {
    fn default_file() -> PathBuf {
        PathBuf::from(DEFAULT_FILE_NAME)
    }

    const fn default_top_n() -> usize {
        10
    }

    /// Load and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, does not parse,
    /// or fails validation.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&body).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero `top_n` or a non-positive end distance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        for (&level, &value) in &self.level_distances.table {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::LevelDistance { level, value });
            }
        }
        let fallback = self.level_distances.fallback;
        if !(fallback.is_finite() && fallback > 0.0) {
            return Err(ConfigError::FallbackDistance(fallback));
        }
        Ok(())
    }
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            file: Self::default_file(),
            top_n: Self::default_top_n(),
            level_distances: LevelDistances::default(),
            excluded_players: Vec::new(),
        }
    }
}

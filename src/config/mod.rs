// TrendCrab - GPL-3.0-or-later
// This file is part of TrendCrab.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// TrendCrab is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// TrendCrab is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with TrendCrab.  If not, see <https://www.gnu.org/licenses/>.

use crate::trend::window::{WindowSpans, DEFAULT_LOOKBACK_HOURS, DEFAULT_RECENT_HOURS};
use crate::trend::{EngineSettings, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Failed to read config {}: {e}", path.display()),
            Self::Parse(path, e) => write!(f, "Failed to parse config {}: {e}", path.display()),
            Self::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Parse(_, e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

const fn default_recent_window_hours() -> i64 {
    DEFAULT_RECENT_HOURS
}

const fn default_lookback_hours() -> i64 {
    DEFAULT_LOOKBACK_HOURS
}

const fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

const fn default_max_attempts() -> usize {
    3
}

/// Job configuration stored in the user config directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Length of the recent window
    #[serde(default = "default_recent_window_hours")]
    pub recent_window_hours: i64,

    /// Total lookback; the older window covers the remainder
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,

    /// Trends published per language partition
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Language partitions, e.g. `["en", "ja"]`. Empty ranks all records together.
    #[serde(default)]
    pub languages: Vec<String>,

    /// Attempts before a retryable store failure is reported
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            recent_window_hours: default_recent_window_hours(),
            lookback_hours: default_lookback_hours(),
            top_n: default_top_n(),
            languages: Vec::new(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl TrendConfig {
    /// Get the path to the default config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trendcrab").join("config.json"))
    }

    /// Load the default config, returning defaults if there is none
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("{e}; using defaults"),
                }
            } else {
                tracing::info!("No config found at {}, using defaults", path.display());
            }
        }

        Self::default()
    }

    /// Load a config file that must exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        tracing::info!(
            "Loaded config from {}: {}h/{}h windows, top {}, {} language partition(s)",
            path.display(),
            config.recent_window_hours,
            config.lookback_hours,
            config.top_n,
            config.languages.len()
        );
        Ok(config)
    }

    /// Save config to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(parent.to_path_buf(), e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        std::fs::write(path, json).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if let Some(blank) = self.languages.iter().find(|l| l.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("blank language tag {blank:?}")));
        }
        self.spans()?;
        Ok(())
    }

    pub fn spans(&self) -> Result<WindowSpans, ConfigError> {
        WindowSpans::from_hours(self.recent_window_hours, self.lookback_hours)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Validated engine settings
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        self.validate()?;
        Ok(EngineSettings {
            spans: self.spans()?,
            top_n: self.top_n,
            languages: self.languages.clone(),
        })
    }
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Persisted settings
//!
//! A small JSON file holding defaults that would otherwise have to be passed
//! on every run. Command-line flags and environment variables override it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;

/// Keys accepted by `config set`
pub const SETTING_KEYS: [&str; 6] = [
    "github_token",
    "cache_dir",
    "cache_ttl_days",
    "primary_branch",
    "workers",
    "timeout_secs",
];

const REDACTED: &str = "********";

/// Contents of `config.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// GitHub access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// Mirror cache root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Mirror lifetime in days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_days: Option<u64>,
    /// Branch that wins deduplication ties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_branch: Option<String>,
    /// Concurrent branch listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Per-branch timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Default settings file location
    ///
    /// - Linux: ~/.config/branchwise/config.json
    /// - macOS: ~/Library/Application Support/branchwise/config.json
    /// - Windows: %APPDATA%\branchwise\config.json
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("branchwise")
            .join("config.json")
    }

    /// Load settings; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SettingsRead` if the file exists but cannot be
    /// read and `ConfigError::SettingsParse` if it is not valid settings JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError::SettingsRead(path.to_path_buf(), e))?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::SettingsParse(path.to_path_buf(), e))
    }

    /// Write settings as pretty JSON, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SettingsWrite` if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SettingsWrite(parent.to_path_buf(), e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SettingsWrite(path.to_path_buf(), e.into()))?;
        fs::write(path, json + "\n").map_err(|e| ConfigError::SettingsWrite(path.to_path_buf(), e))
    }

    /// Update one key from its string form
    ///
    /// An empty value clears the key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownSetting` for a key outside
    /// [`SETTING_KEYS`] and `ConfigError::InvalidSettingValue` if a numeric
    /// key gets a non-numeric value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let text = (!value.is_empty()).then(|| value.to_string());
        match key {
            "github_token" => self.github_token = text,
            "cache_dir" => self.cache_dir = text.map(PathBuf::from),
            "primary_branch" => self.primary_branch = text,
            "cache_ttl_days" => self.cache_ttl_days = parse_number(key, text)?,
            "workers" => self.workers = parse_number(key, text)?,
            "timeout_secs" => self.timeout_secs = parse_number(key, text)?,
            other => return Err(ConfigError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }

    /// Copy with the token masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            github_token: self.github_token.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, text: Option<String>) -> Result<Option<T>, ConfigError> {
    text.map(|value| {
        value.parse().map_err(|_| ConfigError::InvalidSettingValue {
            key: key.to_string(),
            value,
        })
    })
    .transpose()
}

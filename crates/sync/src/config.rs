// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine configuration.
//!
//! Configuration is read from a TOML file (conventionally `fieldsync.toml`);
//! every field has a default so an absent file yields a working setup
//! pointed at a local API.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "fieldsync.toml";

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the report and location APIs (e.g. `https://api.example.com/api`).
    pub api_base_url: String,
    /// Auto-sync period in seconds.
    pub sync_interval_secs: u64,
    /// Maximum number of locations per batch upload.
    pub batch_size: usize,
    /// Timeout for a single gateway request, in seconds.
    pub request_timeout_secs: u64,
    /// Upper bound on a connectivity probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// URL probed by the HTTP reachability probe (defaults to the API base).
    pub health_url: Option<String>,
    /// Validation rejections tolerated before a record is dead-lettered.
    pub max_validation_attempts: u32,
    /// Number of error log entries retained.
    pub max_error_log: usize,
    /// Directory for the persisted queue (default: `$XDG_STATE_HOME/fieldsync`).
    pub state_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            api_base_url: "http://localhost:3001/api".to_string(),
            sync_interval_secs: 60,
            batch_size: 50,
            request_timeout_secs: 30,
            probe_timeout_ms: 3000,
            health_url: None,
            max_validation_attempts: 3,
            max_error_log: fieldsync_core::DEFAULT_ERROR_LOG_LIMIT,
            state_dir: None,
        }
    }
}

impl SyncConfig {
    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SyncConfig::default(),
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Applies `FIELDSYNC_API_URL` and `FIELDSYNC_STATE_DIR` when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = env::api_url() {
            self.api_base_url = url;
        }
        if let Some(dir) = env::state_dir() {
            self.state_dir = Some(dir);
        }
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(Error::Config("api_base_url must not be empty".to_string()));
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "invalid api_base_url '{}': must start with http:// or https://",
                self.api_base_url
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.sync_interval_secs == 0 {
            return Err(Error::Config("sync_interval_secs must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be at least 1".to_string()));
        }
        if self.max_validation_attempts == 0 {
            return Err(Error::Config("max_validation_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// URL hit by the HTTP reachability probe.
    pub fn health_url(&self) -> &str {
        self.health_url.as_deref().unwrap_or(&self.api_base_url)
    }

    /// Resolves the state directory, falling back to the XDG state dir.
    pub fn resolved_state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        if let Some(dir) = env::xdg_state_home() {
            return dir.join("fieldsync");
        }
        dirs::state_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local/state")))
            .map(|d| d.join("fieldsync"))
            .unwrap_or_else(|| PathBuf::from(".fieldsync"))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

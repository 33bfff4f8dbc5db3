// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `offsync.toml` inside the data directory and
//! includes:
//! - `server_url`: base URL of the reconciliation server
//! - `auth_token`: bearer token sent with every batch
//! - `db_file`: queue database, relative to the data directory or absolute
//! - backoff and batch size tuning
//!
//! A missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{SyncOptions, MAX_DRAFTS_PER_BATCH, MAX_EVENTS_PER_BATCH};

const DATA_DIR_NAME: &str = "offsync";
const CONFIG_FILE_NAME: &str = "offsync.toml";
const DB_FILE_NAME: &str = "queue.db";

/// Client configuration stored in `offsync.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the reconciliation server (default: `http://127.0.0.1:7890`).
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Bearer token for the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Queue database file (default: `queue.db`).
    #[serde(default = "default_db_file")]
    pub db_file: String,
    /// Delay before the first retry in milliseconds (default: 2000).
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound on the retry delay in milliseconds (default: 60000).
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Drafts per batch (default: 5).
    #[serde(default = "default_max_drafts_per_batch")]
    pub max_drafts_per_batch: usize,
    /// Events per batch (default: 50).
    #[serde(default = "default_max_events_per_batch")]
    pub max_events_per_batch: usize,
    /// Per-request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_server_url() -> String {
    "http://127.0.0.1:7890".to_string()
}

fn default_db_file() -> String {
    DB_FILE_NAME.to_string()
}

fn default_initial_backoff_ms() -> u64 {
    2_000
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_max_drafts_per_batch() -> usize {
    MAX_DRAFTS_PER_BATCH
}

fn default_max_events_per_batch() -> usize {
    MAX_EVENTS_PER_BATCH
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_url: default_server_url(),
            auth_token: None,
            db_file: default_db_file(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_drafts_per_batch: default_max_drafts_per_batch(),
            max_events_per_batch: default_max_events_per_batch(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Loads configuration from `data_dir`, falling back to defaults when
    /// the file does not exist. Environment overrides are applied last.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?
        } else {
            Config::default()
        };

        if let Some(url) = env::server_url() {
            config.server_url = url;
        }
        if let Some(token) = env::auth_token() {
            config.auth_token = Some(token);
        }
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the orchestrator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_drafts_per_batch == 0 || self.max_events_per_batch == 0 {
            return Err(Error::Config(
                "batch sizes must be at least 1".to_string(),
            ));
        }
        if self.initial_backoff_ms == 0 {
            return Err(Error::Config(
                "initial_backoff_ms must be at least 1".to_string(),
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(Error::Config(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }

    /// Resolves the queue database path.
    pub fn db_path(&self, data_dir: &Path) -> PathBuf {
        let db_file = Path::new(&self.db_file);
        if db_file.is_absolute() {
            db_file.to_path_buf()
        } else {
            data_dir.join(db_file)
        }
    }

    /// Orchestrator tunables from this configuration.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            max_drafts_per_batch: self.max_drafts_per_batch,
            max_events_per_batch: self.max_events_per_batch,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Resolves the data directory: explicit argument, then `OFFSYNC_DATA_DIR`,
/// then the platform's local data directory.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Some(dir) = env::data_dir() {
        return dir;
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

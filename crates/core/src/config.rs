// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service configuration
//!
//! Built once at process start: defaults, then an optional TOML file, then
//! `ORDO_*` environment overrides, then validation. The resulting value is
//! passed explicitly to every component that needs it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding databases, socket, lock and log unless overridden
    pub state_dir: PathBuf,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub bus: BusConfig,
    pub ingest: IngestConfig,
    pub service: ServiceConfig,
    pub daemon: DaemonConfig,
}

/// Relational rank store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
    /// Upper bound on waiting for a row/table lock
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

/// Which cache backs the read path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
    None,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
            CacheBackend::None => "none",
        })
    }
}

/// Cache-aside settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: Option<String>,
    /// Prepended to every key, for sharing one Redis between services
    pub key_prefix: String,
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

/// Message bus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub subject: String,
}

/// Ingestion batcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub batch_size: usize,
    pub sink_path: Option<PathBuf>,
}

/// Write orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deadline for one store call; expiry cancels and rolls back
    #[serde(with = "humantime_serde")]
    pub op_timeout: Duration,
}

/// Daemon file locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub socket_path: Option<PathBuf>,
    pub lock_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".ordo"),
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
            bus: BusConfig::default(),
            ingest: IngestConfig::default(),
            service: ServiceConfig::default(),
            daemon: DaemonConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: None,
            key_prefix: String::new(),
            ttl: Duration::from_secs(60),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            subject: "items".to_string(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            sink_path: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&content)?
            }
            None => Self {
                state_dir: default_state_dir(),
                ..Self::default()
            },
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `ORDO_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("ORDO_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("ORDO_CACHE_TTL") {
            self.cache.ttl =
                humantime::parse_duration(&value).map_err(|e| ConfigError::InvalidEnv {
                    var: "ORDO_CACHE_TTL",
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Some(url) = lookup("ORDO_REDIS_URL") {
            self.cache.backend = CacheBackend::Redis;
            self.cache.redis_url = Some(url);
        }
        if let Some(subject) = lookup("ORDO_BUS_SUBJECT") {
            self.bus.subject = subject;
        }
        if let Some(value) = lookup("ORDO_BATCH_SIZE") {
            self.ingest.batch_size = value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    var: "ORDO_BATCH_SIZE",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.batch_size == 0 {
            return Err(ConfigError::Invalid("ingest.batch_size must be at least 1".into()));
        }
        if self.bus.subject.is_empty() {
            return Err(ConfigError::Invalid("bus.subject must not be empty".into()));
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            return Err(ConfigError::Invalid(
                "cache.redis_url is required for the redis backend".into(),
            ));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| self.state_dir.join("items.db"))
    }

    pub fn sink_path(&self) -> PathBuf {
        self.ingest
            .sink_path
            .clone()
            .unwrap_or_else(|| self.state_dir.join("events.db"))
    }

    pub fn socket_path(&self) -> PathBuf {
        self.daemon
            .socket_path
            .clone()
            .unwrap_or_else(|| self.state_dir.join("ordod.sock"))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.daemon
            .lock_path
            .clone()
            .unwrap_or_else(|| self.state_dir.join("ordod.pid"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.daemon
            .log_path
            .clone()
            .unwrap_or_else(|| self.state_dir.join("ordod.log"))
    }
}

/// XDG_STATE_HOME/ordo, falling back to ~/.local/state/ordo
fn default_state_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("ordo");
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local/state/ordo"),
        Err(_) => PathBuf::from(".ordo"),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: loaded via `serde`+`toml` from a path given on the
//! command line, every field defaulted so a missing or malformed file still
//! produces a usable configuration (mirrors `utils/config.py`'s
//! fallback-on-missing-or-malformed behavior).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub workers: WorkersConfig,
    pub environment: EnvironmentConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            workers: WorkersConfig::default(),
            environment: EnvironmentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub max_workers: u32,
    pub worker_types: Vec<String>,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            worker_types: vec!["env".to_string(), "reward".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub android: AndroidConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            android: AndroidConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    pub snapshot_dir: PathBuf,
    pub claim_dir: PathBuf,
    pub emulator_path: String,
    pub adb_path: String,
    pub avd_name: String,
    pub base_port: u16,
    pub boot_timeout_secs: u64,
    pub max_idle_secs: i64,
    pub idle_sweep_secs: u64,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("snapshots"),
            claim_dir: PathBuf::from("claims"),
            emulator_path: "emulator".to_string(),
            adb_path: "adb".to_string(),
            avd_name: "Pixel6_API33".to_string(),
            base_port: 5554,
            boot_timeout_secs: 60,
            max_idle_secs: 3600,
            idle_sweep_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file at {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

impl Config {
    /// Loads configuration from `path`. A missing file is not an error — it
    /// produces the default configuration, matching `get_default_config()`'s
    /// fallback behavior in the original implementation. A malformed file
    /// IS reported, since the original raises a clear warning too (surfaced
    /// here as an error the caller can decide whether to tolerate).
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Configuration module

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default log filter, used unless `RUST_LOG`, `--debug` or `--trace` is given
    pub log_level: String,

    /// Use the simulated accelerometer instead of the external program
    pub demo_mode: bool,

    /// Acquisition configuration
    pub sensor: SensorConfig,

    /// History and persistence configuration
    pub storage: StorageConfig,

    /// HTTP configuration
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            demo_mode: false,
            sensor: SensorConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("seismo"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Apply `PORT`, `MAX_HISTORY_MINUTES` and `SAMPLE_INTERVAL_MS` from the environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = parse_var(&var, "PORT") {
            self.server.port = port;
        }
        if let Some(minutes) = parse_var(&var, "MAX_HISTORY_MINUTES") {
            self.storage.history_minutes = minutes;
        }
        if let Some(ms) = parse_var(&var, "SAMPLE_INTERVAL_MS") {
            self.sensor.interval_ms = ms;
        }
    }

    /// Reject settings the collector cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sensor.interval_ms == 0 {
            bail!("sensor.interval_ms must be greater than zero");
        }
        if self.storage.history_minutes == 0 {
            bail!("storage.history_minutes must be greater than zero");
        }
        if self.storage.flush_interval_secs == 0 {
            bail!("storage.flush_interval_secs must be greater than zero");
        }
        if self.sensor.program.trim().is_empty() {
            bail!("sensor.program must not be empty");
        }
        self.server.bind_addr()?;
        Ok(())
    }

    /// Retention window in milliseconds
    pub fn history_ms(&self) -> i64 {
        self.storage.history_minutes as i64 * 60 * 1000
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

/// Acquisition configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Acquisition program
    pub program: String,

    /// Program arguments, defaults to `-n 1 -s <channel>`
    pub args: Option<Vec<String>>,

    /// Sensor channel name in the program's output
    pub channel: String,

    /// Pause between the end of one sample and the start of the next
    pub interval_ms: u64,

    /// Kill an acquisition that takes longer than this, 0 disables
    pub timeout_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            program: "termux-sensor".to_string(),
            args: None,
            channel: "accelerometer".to_string(),
            interval_ms: 200,
            timeout_ms: 10_000,
        }
    }
}

impl SensorConfig {
    /// Pause between sampling cycles
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// History and persistence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// History file path
    pub path: PathBuf,

    /// Retention window in minutes
    pub history_minutes: u64,

    /// Prune and flush period in seconds
    pub flush_interval_secs: u64,

    /// Also write the history after every sample
    pub persist_on_sample: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/seismo.json"),
            history_minutes: 60,
            flush_interval_secs: 30,
            persist_on_sample: true,
        }
    }
}

impl StorageConfig {
    /// Period of the prune and flush job
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

/// HTTP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub host: String,
    /// Listen port, 0 picks a free one
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Parsed `host:port`
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        match addr.parse() {
            Ok(addr) => Ok(addr),
            Err(e) => bail!("invalid listen address {}: {}", addr, e),
        }
    }
}

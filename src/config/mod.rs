//! Configuration management for the whisker hub
//!
//! Configuration layers: built-in defaults, an optional TOML file, then
//! `WHISKER_*` environment variable overrides on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::hub::HubConfig;
use crate::ingest::IngestConfig;
use crate::publish::PublisherConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Status log location
    pub log: LogConfig,

    /// Ingest sink configuration
    pub ingest: IngestConfig,

    /// Publisher loop configuration
    pub publisher: PublisherConfig,

    /// Hub server configuration
    pub hub: HubConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Status log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Path of the append-only status log file
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/cat_status_log.txt"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the optional file, then
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply `WHISKER_*` environment variable overrides
    ///
    /// Unparsable values are ignored in favor of the current setting.
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("WHISKER_LOG_PATH") {
            self.log.path = PathBuf::from(path);
        }

        if let Some(tick) = env_parse::<u64>("WHISKER_TICK_SECS") {
            self.publisher.tick_secs = tick;
        }

        if let Some(addr) = env_parse("WHISKER_BIND_ADDRESS") {
            self.hub.bind_address = addr;
        }

        if let Ok(bind) = std::env::var("WHISKER_UDP_BIND") {
            self.ingest.udp_bind = bind;
        }

        if let Some(enable) = env_parse::<bool>("WHISKER_ENABLE_TCP") {
            self.ingest.enable_tcp = enable;
        }

        if let Some(enable) = env_parse::<bool>("WHISKER_ENABLE_UDP") {
            self.ingest.enable_udp = enable;
        }

        if let Ok(dir) = std::env::var("WHISKER_STATIC_DIR") {
            self.hub.static_dir = Some(PathBuf::from(dir));
        }

        if let Ok(level) = std::env::var("WHISKER_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("WHISKER_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.log.path.as_os_str().is_empty() {
            anyhow::bail!("log.path must not be empty");
        }

        self.publisher
            .validate()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        self.ingest
            .validate()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        self.hub
            .validate()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            ingest: IngestConfig::default(),
            publisher: PublisherConfig::default(),
            hub: HubConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.publisher.tick_secs, 5);
        assert_eq!(config.log.path, PathBuf::from("data/cat_status_log.txt"));
    }

    #[test]
    fn test_invalid_tick_rejected() {
        let mut config = Config::default();
        config.publisher.tick_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whisker.toml");
        std::fs::write(
            &path,
            "[log]\npath = \"/tmp/test_status.log\"\n\n[publisher]\ntick_secs = 2\nchannel_capacity = 16\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.log.path, PathBuf::from("/tmp/test_status.log"));
        assert_eq!(config.publisher.tick_secs, 2);
        // Unspecified sections keep their defaults
        assert_eq!(config.hub.bind_address.port(), 3000);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("WHISKER_TICK_SECS", "9");
        std::env::set_var("WHISKER_LOG_PATH", "/tmp/env_status.log");

        let mut config = Config::default();
        config.apply_env();

        std::env::remove_var("WHISKER_TICK_SECS");
        std::env::remove_var("WHISKER_LOG_PATH");

        assert_eq!(config.publisher.tick_secs, 9);
        assert_eq!(config.log.path, PathBuf::from("/tmp/env_status.log"));
    }

    #[test]
    #[serial]
    fn test_unparsable_env_is_ignored() {
        std::env::set_var("WHISKER_TICK_SECS", "not-a-number");

        let mut config = Config::default();
        config.apply_env();

        std::env::remove_var("WHISKER_TICK_SECS");

        assert_eq!(config.publisher.tick_secs, 5);
    }
}

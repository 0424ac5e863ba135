//! Optional TOML settings for a validation run.
//!
//! No file is read unless one is passed with `--config`, and a path given
//! there must exist. Every key is
//! optional; missing keys fall back to `Config::default()`, which reproduces
//! the plain no-argument run (port discovery on localhost).
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{DEFAULT_PORTS, PROBE_TIMEOUT};
use crate::util::{validate_base_url, UrlError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid base_url: {0}")]
    InvalidBaseUrl(#[from] UrlError),

    #[error("Invalid {key}: {value:?} (must start with '/')")]
    InvalidPath { key: &'static str, value: String },

    #[error("Timeout must be at least 1 second: {0}")]
    InvalidTimeout(&'static str),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Settings for one run of the validator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed server base URL (e.g. `http://localhost:3001`). Skips discovery.
    pub base_url: Option<String>,

    /// Host probed during discovery.
    pub host: String,

    /// Ports probed in order during discovery.
    pub candidate_ports: Vec<u16>,

    /// Per-port probe timeout in seconds.
    pub probe_timeout_secs: u64,

    /// Feed fetch timeout in seconds.
    pub fetch_timeout_secs: u64,

    /// Path of the RSS 2.0 feed on the server.
    pub rss_path: String,

    /// Path of the Atom 1.0 feed on the server.
    pub atom_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            host: "localhost".to_string(),
            candidate_ports: DEFAULT_PORTS.to_vec(),
            probe_timeout_secs: PROBE_TIMEOUT.as_secs(),
            fetch_timeout_secs: 30,
            rss_path: "/feed.xml".to_string(),
            atom_path: "/atom.xml".to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "base_url",
        "host",
        "candidate_ports",
        "probe_timeout_secs",
        "fetch_timeout_secs",
        "rss_path",
        "atom_path",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::Io)`; the path was asked for explicitly
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Values that fail [`Config::validate`] → error
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read config file");
                return Err(ConfigError::Io(e));
            }
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text. See [`Config::load`].
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        tracing::info!(
            base_url = ?config.base_url,
            ports = ?config.candidate_ports,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Checks values serde cannot: URL shape, path prefixes and timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.base_url {
            validate_base_url(base_url)?;
        }
        for (key, value) in [("rss_path", &self.rss_path), ("atom_path", &self.atom_path)] {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidPath {
                    key,
                    value: value.clone(),
                });
            }
        }
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("probe_timeout_secs"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("fetch_timeout_secs"));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

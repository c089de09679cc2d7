//! Configuration loader
//!
//! Loads client configuration from environment variables or a file.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `KACHY_ACCESS_KEY` is not set, falls back to loading from file
//! 3. Probes a small list of paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Values missing from a file still resolve through the environment and the
//! built-in defaults, exactly like [`KachyConfig::builder`].
//!
//! ## Environment Variables
//! - `KACHY_ACCESS_KEY`: Bearer credential (required)
//! - `KACHY_BASE_URL`: Proxy base URL
//! - `KACHY_TIMEOUT`: Request timeout in seconds
//! - `KACHY_MAX_RETRIES`: Retries after the first attempt
//! - `KACHY_RETRY_DELAY`: Backoff factor in seconds
//! - `KACHY_POOL_SIZE`: Idle connections kept per host
//! - `KACHY_CONFIG`: Explicit config file path
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `$KACHY_CONFIG`
//! 2. `./kachy.toml`, then `./kachy.json` (current working directory)

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use kachy_domain::constants::ENV_CONFIG_PATH;
use kachy_domain::{KachyConfig, KachyConfigBuilder, KachyError, Result};
use serde::Deserialize;

/// On-disk configuration. Field names match the environment settings.
#[derive(Clone, Deserialize)]
pub struct ConfigFile {
    pub access_key: String,
    pub base_url: Option<String>,
    pub timeout: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<f64>,
    pub pool_size: Option<usize>,
    pub user_agent: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Builder seeded with every value present in the file.
    pub fn into_builder(self) -> KachyConfigBuilder {
        let mut builder = KachyConfig::builder(self.access_key);
        if let Some(base_url) = self.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(max_retries) = self.max_retries {
            builder = builder.max_retries(max_retries);
        }
        if let Some(retry_delay) = self.retry_delay {
            builder = builder.retry_delay(retry_delay);
        }
        if let Some(pool_size) = self.pool_size {
            builder = builder.pool_size(pool_size);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        builder
    }
}

impl fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFile")
            .field("access_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("pool_size", &self.pool_size)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If that fails, falls
/// back to loading from a config file.
///
/// # Errors
/// Returns `KachyError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The access key is missing
pub fn load() -> Result<KachyConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `KACHY_*` environment variables.
///
/// # Errors
/// Returns `KachyError::Config` if `KACHY_ACCESS_KEY` is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<KachyConfig> {
    KachyConfig::from_env()
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `KachyError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The access key is missing or empty
pub fn load_from_file(path: Option<PathBuf>) -> Result<KachyConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(KachyError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            KachyError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| KachyError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)?.into_builder().build()
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `KachyError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<ConfigFile> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KachyError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KachyError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(KachyError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard paths for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(explicit) = std::env::var(ENV_CONFIG_PATH) {
        candidates.push(PathBuf::from(explicit));
    }

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend([cwd.join("kachy.toml"), cwd.join("kachy.json")]);
    }

    candidates.into_iter().find(|path| path.exists())
}

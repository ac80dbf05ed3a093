//! Pipeline configuration loading.
//!
//! Loads from `~/.config/profilesmith/config.toml` (or the path in
//! `PROFILESMITH_CONFIG`). A missing file yields the defaults; a present
//! but unparseable file is an error. All values here are read-only inputs
//! to the resolver.

use crate::errors::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for the pipeline.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Whether the remote tier may be consulted at all.
    #[serde(default = "default_true")]
    pub live_fetch_enabled: bool,

    /// Whether the memory and durable cache tiers are consulted.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Directory holding the durable cache tier (one JSON file per section).
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Base URL of the upstream specification host.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request deadline for remote fetches, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Durable-tier expiration for remote fetch results, in hours.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Retry policy for the remote tier.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Batched section resolution settings.
    #[serde(default)]
    pub batch: BatchConfig,
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> String {
    dirs::cache_dir()
        .map(|d| d.join("profilesmith").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".profilesmith-cache".to_string())
}

fn default_base_url() -> String {
    "https://developer.apple.com/tutorials/data/documentation/devicemanagement".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_hours() -> u64 {
    24
}

/// Exponential backoff settings for remote fetches. 404 responses are never
/// retried regardless of these values.
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Delay before the first retry; doubles on each subsequent retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Admission control for batched section resolution: fixed-size batches run
/// concurrently inside, sequentially across, with a short pause between.
#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    #[serde(default = "default_batch_size")]
    pub size: usize,

    #[serde(default = "default_batch_delay_ms")]
    pub delay_ms: u64,
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_delay_ms() -> u64 {
    100
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            delay_ms: default_batch_delay_ms(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            live_fetch_enabled: true,
            cache_enabled: true,
            cache_dir: default_cache_dir(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_hours: default_cache_ttl_hours(),
            retry: RetryConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// The config file path, honoring the `PROFILESMITH_CONFIG` override.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PROFILESMITH_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("profilesmith")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.clone(),
            message: err.to_string(),
        })
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache_ttl_hours as i64)
    }
}

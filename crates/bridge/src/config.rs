//! Configuration loading from skiff.toml.

use serde::Deserialize;
use std::path::Path;

/// Bridge-wide configuration.
///
/// Every field has a default so an empty file (or no file) works.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Label attached to usage-ledger entries for this bridge instance.
    pub origin: String,

    /// Maximum provider round trips per dispatch.
    pub max_iterations: u32,

    /// Tool-result caching toggle.
    pub cache_enabled: bool,

    /// Default TTL for cache entries, in seconds.
    pub cache_ttl_seconds: u64,

    /// Redis URL for the shared cache tier. Unset means local-only.
    pub redis_url: Option<String>,

    /// Key namespace for the remote tier.
    pub cache_prefix: String,

    /// Minimum `max_length` forced onto fetch-style tool calls.
    pub min_fetch_length: u64,

    /// Document extraction toggle.
    pub extract_enabled: bool,

    /// Download size policy for the document extractor, in bytes.
    pub extract_max_bytes: u64,

    /// Character cap on extracted document text.
    pub extract_max_chars: usize,

    /// Completion monitor poll interval, in milliseconds.
    pub monitor_interval_ms: u64,

    /// Artifacts smaller than this are treated as partial writes.
    pub monitor_min_bytes: u64,

    /// Wall-clock budget for one early-stop operation, in seconds.
    pub operation_timeout_seconds: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            origin: "bridge".into(),
            max_iterations: 10,
            cache_enabled: true,
            cache_ttl_seconds: cache::DEFAULT_TTL_SECONDS,
            redis_url: None,
            cache_prefix: "skiff:tool_cache".into(),
            min_fetch_length: 5_000,
            extract_enabled: true,
            extract_max_bytes: extract::DEFAULT_MAX_BYTES,
            extract_max_chars: extract::DEFAULT_MAX_CHARS,
            monitor_interval_ms: 500,
            monitor_min_bytes: 1_000,
            operation_timeout_seconds: 600,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment overrides. `SKIFF_REDIS_URL` points the remote
    /// cache tier at a server without editing the file.
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var("SKIFF_REDIS_URL") {
            if !url.is_empty() {
                self.redis_url = Some(url);
            }
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

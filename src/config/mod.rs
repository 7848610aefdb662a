//! Configuration management for wikilabel
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. The client-identifying `User-Agent` lives here
//! and is handed to the HTTP client at construction.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::endpoint::WIKIDATA_SPARQL_URL;
use crate::error::{Error, Result};
use crate::translation::query::{DEFAULT_BATCH_SIZE, DEFAULT_LIMIT, DEFAULT_MAX_BATCH_CHARS};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SPARQL endpoint configuration
    pub endpoint: EndpointConfig,

    /// Query paging and batching configuration
    pub query: QueryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Endpoint-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// SPARQL endpoint URL
    pub url: String,

    /// User agent string, see https://meta.wikimedia.org/wiki/User-Agent_policy
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Client-side throttle (requests per second)
    pub requests_per_second: u32,
}

/// Query paging and batching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Number of (entity, value) pairs per page for full extraction
    pub limit: usize,

    /// Maximum identifiers in one VALUES batch
    pub batch_size: usize,

    /// Maximum rendered characters of one VALUES batch
    pub max_batch_chars: usize,

    /// Remove repeated labels inside a cell
    pub dedup_labels: bool,

    /// Auxiliary ontology passes allowed in flight at once
    pub max_concurrent_auxiliary: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::from(WIKIDATA_SPARQL_URL),
            user_agent: String::new(),
            timeout_secs: 60,
            requests_per_second: 5,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            batch_size: DEFAULT_BATCH_SIZE,
            max_batch_chars: DEFAULT_MAX_BATCH_CHARS,
            dedup_labels: false,
            max_concurrent_auxiliary: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `WIKILABEL_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("WIKILABEL_ENDPOINT_URL") {
            self.endpoint.url = url;
        }
        if let Ok(user_agent) = std::env::var("WIKILABEL_USER_AGENT") {
            self.endpoint.user_agent = user_agent;
        }
        if let Some(timeout) = env_parse("WIKILABEL_TIMEOUT") {
            self.endpoint.timeout_secs = timeout;
        }
        if let Some(rps) = env_parse("WIKILABEL_REQUESTS_PER_SECOND") {
            self.endpoint.requests_per_second = rps;
        }
        if let Some(limit) = env_parse("WIKILABEL_LIMIT") {
            self.query.limit = limit;
        }
        if let Some(batch_size) = env_parse("WIKILABEL_BATCH_SIZE") {
            self.query.batch_size = batch_size;
        }
        if let Some(max_batch_chars) = env_parse("WIKILABEL_MAX_BATCH_CHARS") {
            self.query.max_batch_chars = max_batch_chars;
        }
        if let Some(dedup) = env_parse("WIKILABEL_DEDUP_LABELS") {
            self.query.dedup_labels = dedup;
        }
        if let Some(max) = env_parse("WIKILABEL_MAX_CONCURRENT_AUXILIARY") {
            self.query.max_concurrent_auxiliary = max;
        }
        if let Ok(level) = std::env::var("WIKILABEL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("WIKILABEL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.endpoint.validate()?;

        if self.query.limit == 0 {
            return Err(Error::config("query.limit", "must be greater than 0"));
        }
        if self.query.batch_size == 0 {
            return Err(Error::config("query.batch_size", "must be greater than 0"));
        }
        if self.query.max_batch_chars == 0 {
            return Err(Error::config("query.max_batch_chars", "must be greater than 0"));
        }
        if self.query.max_concurrent_auxiliary == 0 {
            return Err(Error::config(
                "query.max_concurrent_auxiliary",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl EndpointConfig {
    /// Configuration for `url` identified by `user_agent`
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: user_agent.into(),
            ..Default::default()
        }
    }

    /// Validate endpoint values
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(Error::config(
                "endpoint.user_agent",
                "a descriptive User-Agent must be set before querying the endpoint",
            ));
        }

        url::Url::parse(&self.url)
            .map_err(|e| Error::config("endpoint.url", format!("'{}': {e}", self.url)))?;

        if self.requests_per_second == 0 {
            return Err(Error::config(
                "endpoint.requests_per_second",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

//! Configuration loading for the holdings aggregator
//!
//! Settings come either from a JSON file (`--config <PATH>`) or from
//! environment variables, falling back to defaults for anything unset.

use holdings_generator::{MAX_TRADES_PER_SEC, MIN_TRADES_PER_SEC};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite connection string
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default)]
    pub ingest: IngestConfig,

    /// Per-operation store timeout; 0 disables it
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin, or `*`
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

/// Where trade payloads come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestSource {
    /// Newline-delimited JSON on standard input
    #[default]
    Stdin,
    /// In-process trade generator
    Simulate,
    /// Serve reads only
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub source: IngestSource,
    /// Generator rate when `source` is `simulate`
    #[serde(default = "default_trades_per_sec")]
    pub trades_per_sec: u32,
    /// Fixed generator seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_database_url() -> String {
    "sqlite://holdings.db".to_string()
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_trades_per_sec() -> u32 {
    1
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database_url: default_database_url(),
            ingest: IngestConfig::default(),
            store_timeout_ms: default_store_timeout_ms(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source: IngestSource::default(),
            trades_per_sec: default_trades_per_sec(),
            seed: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl FromStr for IngestSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdin" => Ok(IngestSource::Stdin),
            "simulate" => Ok(IngestSource::Simulate),
            "none" => Ok(IngestSource::None),
            other => Err(ConfigError::invalid("INGEST_SOURCE", format!("unknown source '{other}'"))),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::invalid("LOG_FORMAT", format!("unknown format '{other}'"))),
        }
    }
}

impl AggregatorConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = var("HOST") {
            config.server.host = host;
        }
        if let Some(port) = var("PORT") {
            config.server.port = parse_var("PORT", &port)?;
        }
        if let Some(origin) = var("CORS_ORIGIN") {
            config.server.cors_origin = origin.trim().to_string();
        }
        if let Some(url) = var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(source) = var("INGEST_SOURCE") {
            config.ingest.source = source.parse()?;
        }
        if let Some(rate) = var("TRADES_PER_SEC") {
            config.ingest.trades_per_sec = parse_var("TRADES_PER_SEC", &rate)?;
        }
        if let Some(seed) = var("GENERATOR_SEED") {
            config.ingest.seed = Some(parse_var("GENERATOR_SEED", &seed)?);
        }
        if let Some(capacity) = var("INGEST_CHANNEL_CAPACITY") {
            config.ingest.channel_capacity = parse_var("INGEST_CHANNEL_CAPACITY", &capacity)?;
        }
        if let Some(timeout) = var("STORE_TIMEOUT_MS") {
            config.store_timeout_ms = parse_var("STORE_TIMEOUT_MS", &timeout)?;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.cors_origin.is_empty() {
            return Err(ConfigError::invalid("CORS_ORIGIN", "must not be empty"));
        }
        if self.server.cors_origin != "*"
            && axum::http::HeaderValue::from_str(&self.server.cors_origin).is_err()
        {
            return Err(ConfigError::invalid("CORS_ORIGIN", "not a valid header value"));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::invalid("DATABASE_URL", "must not be empty"));
        }
        if !(MIN_TRADES_PER_SEC..=MAX_TRADES_PER_SEC).contains(&self.ingest.trades_per_sec) {
            return Err(ConfigError::invalid(
                "TRADES_PER_SEC",
                format!("must be between {MIN_TRADES_PER_SEC} and {MAX_TRADES_PER_SEC}"),
            ));
        }
        if self.ingest.channel_capacity == 0 {
            return Err(ConfigError::invalid("INGEST_CHANNEL_CAPACITY", "must be positive"));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        (self.store_timeout_ms > 0).then(|| Duration::from_millis(self.store_timeout_ms))
    }
}

fn parse_var<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

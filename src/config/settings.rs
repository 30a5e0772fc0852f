//! Configuration structures for logship

use crate::{LogShipError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default collection endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/v1/logs";

/// Default service name stamped on every entry
pub const DEFAULT_SERVICE: &str = "default";

/// Prefix for environment variable overrides, e.g. `LOGSHIP_API_KEY`
pub const ENV_PREFIX: &str = "LOGSHIP";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API key sent as `X-Api-Key`
    pub api_key: String,
    /// API secret sent as a bearer token
    pub api_secret: String,
    /// Collection endpoint URL
    pub endpoint: String,
    /// Service name stamped on every entry
    pub service: String,
    /// Entries per batch before a flush is forced
    pub batch_size: usize,
    /// Capacity of the intake queue
    pub queue_capacity: usize,
    /// Number of background workers
    pub worker_count: usize,
    /// Delivery attempts per batch, including the first
    pub max_attempts: u32,
    /// Maximum age of a non-empty batch before it is flushed
    pub flush_interval_ms: u64,
    /// Per-attempt HTTP timeout
    pub request_timeout_ms: u64,
    /// Base delay for exponential backoff between attempts
    pub backoff_base_ms: u64,
    /// How long an idle worker waits on the queue before re-checking
    pub dequeue_timeout_ms: u64,
    /// How long `close` waits for each worker to drain
    pub join_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            batch_size: 100,
            queue_capacity: 4096,
            worker_count: 3,
            max_attempts: 3,
            flush_interval_ms: 1000,
            request_timeout_ms: 5000,
            backoff_base_ms: 100,
            dequeue_timeout_ms: 1000,
            join_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Default configuration with the given credentials
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Default::default()
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LogShipError::Config(format!("Failed to read config file: {}", e)))?;

        let config: ClientConfig = toml::from_str(&content)
            .map_err(|e| LogShipError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, an optional TOML file and `LOGSHIP_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::resolve(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Same layering as [`ClientConfig::load`] without validation, so callers
    /// can apply further overrides first
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&ClientConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config: ClientConfig = builder
            // Values stay strings so numeric-looking credentials are kept intact;
            // integer fields are parsed from them during deserialization
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() || self.api_secret.trim().is_empty() {
            return Err(LogShipError::Config("Credentials missing: api_key and api_secret are required".to_string()));
        }
        if self.service.is_empty() {
            return Err(LogShipError::Config("Service name cannot be empty".to_string()));
        }
        let url = Url::parse(&self.endpoint)
            .map_err(|e| LogShipError::Config(format!("Invalid endpoint {:?}: {}", self.endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LogShipError::Config(format!("Unsupported endpoint scheme: {}", url.scheme())));
        }
        if self.batch_size == 0 {
            return Err(LogShipError::Config("Batch size must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(LogShipError::Config("Queue capacity must be at least 1".to_string()));
        }
        if self.worker_count == 0 {
            return Err(LogShipError::Config("Worker count must be at least 1".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(LogShipError::Config("Max attempts must be at least 1".to_string()));
        }
        if self.dequeue_timeout_ms == 0 {
            return Err(LogShipError::Config("Dequeue timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Flush interval as a `Duration`
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Per-attempt request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Backoff base as a `Duration`
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Dequeue wait as a `Duration`
    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    /// Per-worker join timeout as a `Duration`
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

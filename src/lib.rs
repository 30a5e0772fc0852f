//! # logship - Non-Blocking Batched Log Shipping
//!
//! logship lets application code emit structured log entries synchronously while a
//! small pool of background workers batches them and forwards them to a remote
//! collection endpoint over HTTP.
//!
//! ## Features
//!
//! - **Never blocks the caller**: logging calls only touch a bounded queue
//! - **Backpressure**: a full queue drops the entry instead of growing memory
//! - **Batching**: flush on batch size or flush interval, whichever comes first
//! - **Retries**: exponential backoff for 5xx and network failures, fail fast on 4xx
//! - **Graceful shutdown**: `close` drains pending entries within a bounded wait
//!
//! ## Quick Start
//!
//! ```no_run
//! use logship::client::LogClient;
//! use logship::types::LogData;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LogClient::new("my-api-key", "my-api-secret")?;
//!
//!     client.info("Application started");
//!
//!     let mut data = LogData::new();
//!     data.insert("user_id".to_string(), serde_json::json!(12345));
//!     client.warn_with_data("Slow login", data);
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod shipper;
pub mod types;

/// Common error types used throughout logship
pub mod error {
    use std::fmt;

    /// logship error types
    #[derive(Debug)]
    pub enum LogShipError {
        /// I/O operation failed
        Io(std::io::Error),
        /// Serialization/deserialization failed
        Serde(serde_json::Error),
        /// Configuration error
        Config(String),
        /// No async runtime available to host the workers
        Runtime(String),
        /// HTTP transport failure
        Http(reqwest::Error),
    }

    impl fmt::Display for LogShipError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                LogShipError::Io(e) => write!(f, "I/O error: {}", e),
                LogShipError::Serde(e) => write!(f, "Serialization error: {}", e),
                LogShipError::Config(e) => write!(f, "Configuration error: {}", e),
                LogShipError::Runtime(e) => write!(f, "Runtime error: {}", e),
                LogShipError::Http(e) => write!(f, "HTTP error: {}", e),
            }
        }
    }

    impl std::error::Error for LogShipError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                LogShipError::Io(e) => Some(e),
                LogShipError::Serde(e) => Some(e),
                LogShipError::Http(e) => Some(e),
                _ => None,
            }
        }
    }

    impl From<std::io::Error> for LogShipError {
        fn from(err: std::io::Error) -> Self {
            LogShipError::Io(err)
        }
    }

    impl From<serde_json::Error> for LogShipError {
        fn from(err: serde_json::Error) -> Self {
            LogShipError::Serde(err)
        }
    }

    impl From<reqwest::Error> for LogShipError {
        fn from(err: reqwest::Error) -> Self {
            LogShipError::Http(err)
        }
    }

    impl From<::config::ConfigError> for LogShipError {
        fn from(err: ::config::ConfigError) -> Self {
            LogShipError::Config(err.to_string())
        }
    }

    /// Result type alias for logship operations
    pub type Result<T> = std::result::Result<T, LogShipError>;
}

pub use error::{LogShipError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{LogClient, LogLevel};
    pub use crate::config::ClientConfig;
    pub use crate::shipper::{DispatchOutcome, StatsSnapshot, Transport};
    pub use crate::types::{LogData, LogEntry};
    pub use crate::{LogShipError, Result};
}

//! Log entry types and utilities

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Type alias for the structured payload attached to an entry
pub type LogData = HashMap<String, serde_json::Value>;

/// Log severity levels understood by the collection endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug: diagnostic detail
    Debug,
    /// Info: informational messages
    Info,
    /// Warn: something unexpected but recoverable
    Warn,
    /// Error: error conditions
    Error,
    /// Critical: the service is impaired
    Critical,
}

impl LogLevel {
    /// Wire name of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Critical => write!(f, "CRIT"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "critical" | "crit" => Ok(LogLevel::Critical),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// A structured log entry, serialized as one element of a batch body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log severity level
    pub level: LogLevel,

    /// Primary log message
    pub message: String,

    /// Name of the service that produced the entry
    pub service: String,

    /// Timestamp taken when the entry was built
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,

    /// Additional structured data
    #[serde(default)]
    pub data: LogData,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time
    pub fn new(level: LogLevel, service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            service: service.into(),
            timestamp: Utc::now(),
            data: LogData::new(),
        }
    }

    /// Attach a structured payload
    pub fn with_data(mut self, data: LogData) -> Self {
        self.data = data;
        self
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// Millisecond precision with a trailing `Z`, e.g. 2024-05-01T12:00:00.123Z
mod iso8601 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

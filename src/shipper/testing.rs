//! In-memory transport for unit tests

use crate::shipper::transport::{BatchRequest, Transport};
use crate::types::LogEntry;
use crate::{LogShipError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::collections::VecDeque;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Reply {
    Status(StatusCode),
    NetworkError,
}

struct Call {
    at: Instant,
    headers: HeaderMap,
    entries: Vec<LogEntry>,
}

/// Replays scripted replies, then `fallback` forever, recording every call
pub(crate) struct RecordingTransport {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTransport {
    pub(crate) fn always(reply: Reply) -> Self {
        Self::scripted(Vec::new(), reply)
    }

    pub(crate) fn scripted(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().iter().map(|c| c.at).collect()
    }

    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().iter().map(|c| c.entries.len()).collect()
    }

    pub(crate) fn headers(&self, call: usize) -> HeaderMap {
        self.calls.lock()[call].headers.clone()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .flat_map(|c| c.entries.iter().map(|e| e.message.clone()))
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, request: &BatchRequest) -> Result<StatusCode> {
        let entries: Vec<LogEntry> = serde_json::from_slice(&request.body)?;
        self.calls.lock().push(Call {
            at: Instant::now(),
            headers: request.headers.clone(),
            entries,
        });

        let reply = self.script.lock().pop_front().unwrap_or(self.fallback);
        match reply {
            Reply::Status(status) => Ok(status),
            Reply::NetworkError => Err(LogShipError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

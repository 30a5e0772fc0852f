//! Batch delivery with bounded retries and exponential backoff

use crate::config::ClientConfig;
use crate::shipper::stats::ShipperStats;
use crate::shipper::transport::{BatchRequest, Transport};
use crate::types::LogEntry;
use crate::{LogShipError, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Attempt budget and backoff schedule for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per batch, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt number `attempt` (zero based):
    /// `backoff_base * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(100),
        }
    }
}

/// How a batch was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The endpoint answered 2xx
    Delivered {
        /// Attempts used, including the successful one
        attempts: u32,
    },
    /// The endpoint answered 4xx; the batch was not retried
    Rejected {
        /// Status returned by the endpoint
        status: StatusCode,
    },
    /// Every attempt failed with a retryable outcome
    Exhausted {
        /// Attempts made
        attempts: u32,
    },
    /// The batch could not be serialized
    Unencodable,
}

impl DispatchOutcome {
    /// Whether the batch reached the endpoint
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Serializes batches and delivers them through a [`Transport`]
pub struct BatchDispatcher {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    headers: HeaderMap,
    request_timeout: Duration,
    retry: RetryPolicy,
    stats: Arc<ShipperStats>,
}

impl BatchDispatcher {
    /// Create a dispatcher for the endpoint and credentials in `config`
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        stats: Arc<ShipperStats>,
    ) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| LogShipError::Config(format!("Invalid endpoint: {}", e)))?;

        Ok(Self {
            transport,
            endpoint,
            headers: build_headers(&config.api_key, &config.api_secret)?,
            request_timeout: config.request_timeout(),
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                backoff_base: config.backoff_base(),
            },
            stats,
        })
    }

    /// Deliver one batch, retrying transient failures.
    ///
    /// 2xx succeeds, 4xx is final, anything else (5xx, unexpected statuses,
    /// transport errors and timeouts) backs off for `delay_for(attempt)` and is
    /// retried until the attempt budget is spent. The backoff also runs after
    /// the last failed attempt, so a worker never hammers a failing endpoint.
    pub async fn dispatch(&self, batch: &[LogEntry]) -> DispatchOutcome {
        if batch.is_empty() {
            return DispatchOutcome::Delivered { attempts: 0 };
        }

        let body = match serde_json::to_vec(batch) {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                error!("Failed to serialize batch of {} entries: {}", batch.len(), e);
                self.stats.record_rejected(batch.len());
                return DispatchOutcome::Unencodable;
            }
        };

        let request = BatchRequest {
            endpoint: self.endpoint.clone(),
            headers: self.headers.clone(),
            body,
            timeout: self.request_timeout,
        };

        let mut attempt: u32 = 0;
        loop {
            match self.transport.post(&request).await {
                Ok(status) if status.is_success() => {
                    debug!(entries = batch.len(), attempts = attempt + 1, "Batch delivered");
                    self.stats.record_delivered(batch.len());
                    return DispatchOutcome::Delivered { attempts: attempt + 1 };
                }
                Ok(status) if status.is_client_error() => {
                    let _ = writeln!(
                        std::io::stderr(),
                        "logship: endpoint rejected batch of {} entries with {}; check credentials",
                        batch.len(),
                        status
                    );
                    self.stats.record_rejected(batch.len());
                    return DispatchOutcome::Rejected { status };
                }
                Ok(status) => {
                    warn!(attempt, %status, "Retryable response from endpoint");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Failed to send batch");
                }
            }

            let delay = self.retry.delay_for(attempt);
            attempt += 1;
            let exhausted = attempt >= self.retry.max_attempts;
            if !exhausted {
                self.stats.record_retry();
            }
            tokio::time::sleep(delay).await;

            if exhausted {
                error!(
                    entries = batch.len(),
                    attempts = attempt,
                    "Giving up on batch after exhausting retries"
                );
                self.stats.record_exhausted(batch.len());
                return DispatchOutcome::Exhausted { attempts: attempt };
            }
        }
    }
}

fn build_headers(api_key: &str, api_secret: &str) -> Result<HeaderMap> {
    let mut key = HeaderValue::from_str(api_key)
        .map_err(|_| LogShipError::Config("API key contains characters not allowed in a header".to_string()))?;
    key.set_sensitive(true);

    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_secret))
        .map_err(|_| LogShipError::Config("API secret contains characters not allowed in a header".to_string()))?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(API_KEY_HEADER, key);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

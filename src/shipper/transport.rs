//! HTTP transport used by the dispatcher

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// One outbound POST carrying a serialized batch
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Collection endpoint
    pub endpoint: Url,
    /// Content type and credential headers
    pub headers: HeaderMap,
    /// JSON array of entries
    pub body: Bytes,
    /// Upper bound for this attempt
    pub timeout: Duration,
}

/// Sends a batch request and reports the HTTP status.
///
/// Any `Err` is treated by the dispatcher as a transient failure.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform a single POST attempt
    async fn post(&self, request: &BatchRequest) -> Result<StatusCode>;
}

/// [`Transport`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with its own connection pool
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("logship/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &BatchRequest) -> Result<StatusCode> {
        let response = self
            .client
            .post(request.endpoint.clone())
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .body(request.body.clone())
            .send()
            .await?;
        Ok(response.status())
    }
}

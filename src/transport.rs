//! HTTP transport seam between the orchestrator and reqwest.
//!
//! The orchestrator only needs "GET this endpoint with these parameters and
//! give me status + body". Keeping that behind a trait lets tests script
//! responses without a network and keeps retry classification in one place:
//! a [`TransportError`] is transient by construction, while status-code
//! classification belongs to the orchestrator.

use async_trait::async_trait;

use crate::config::{Settings, API_HOST};
use crate::error::PitchsideError;

/// Transport-level failure. Both variants are presumed transient and
/// eligible for bounded retry with backoff.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The per-request deadline elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// Connection-level failure (DNS, TLS, refused, reset, body read).
    #[error("connection error: {0}")]
    Connect(String),
}

/// Raw upstream reply before any classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal GET-only contract the orchestrator depends on.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET for `endpoint` (a path such as `/fixtures`) with the
    /// given query parameters.
    async fn get(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, TransportError>;
}

/// Transport backed by a pooled `reqwest::Client`.
///
/// The connection pool lives exactly as long as this value: dropping it on
/// any exit path (success, error, cancellation) releases the pool.
/// Credentials ride as default headers so every request is authenticated.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(settings: &Settings) -> crate::error::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        let key = reqwest::header::HeaderValue::from_str(&settings.api_key)
            .map_err(|e| PitchsideError::Config(format!("invalid API key header: {e}")))?;
        headers.insert("x-rapidapi-key", key);
        headers.insert(
            "x-rapidapi-host",
            reqwest::header::HeaderValue::from_static(API_HOST),
        );

        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| PitchsideError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;
        Ok(RawResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else {
        TransportError::Connect(error.to_string())
    }
}

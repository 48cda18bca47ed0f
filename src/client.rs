//! Request orchestrator: cache lookup, throttle admission, bounded retries.
//!
//! One logical call walks: cache check → limiter check (single wait, no
//! re-check) → up to `max_retries` attempts. Each attempt records a quota
//! slot *before* the call goes out, so a retrying call really spends one
//! slot per upstream hit — and a caller that cancels mid-attempt has still
//! spent the slot. Neither the cache mutex nor the limiter mutex is held
//! across a sleep or network call, so concurrent logical calls only contend
//! for microseconds. Identical concurrent calls are not collapsed; both go
//! upstream and the last `cache.set` wins.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheStats, ResponseCache};
use crate::config::Settings;
use crate::error::{PitchsideError, Result};
use crate::limiter::{RateLimiter, RateLimiterStats};
use crate::transport::{HttpTransport, RawResponse, ReqwestTransport, TransportError};

/// Backoff unit (seconds) for timeouts and connection errors, scaled
/// linearly by the attempt number.
const TRANSIENT_BACKOFF_SECS: u64 = 2;

/// Backoff unit (seconds) after an upstream 429. Longer than the generic
/// unit: a 429 signals sustained throttling, not a one-off glitch.
const THROTTLE_BACKOFF_SECS: u64 = 5;

/// Resilient client for the API-Football upstream.
///
/// Construct one per process (or per test) and share it; the cache and
/// limiter are owned here and injected explicitly rather than living in
/// ambient globals, so tests get fresh state for free.
pub struct FootballClient {
    settings: Settings,
    transport: Arc<dyn HttpTransport>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
}

impl FootballClient {
    /// Wire up a client from settings with the real reqwest transport.
    pub fn new(settings: Settings) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&settings)?);
        let limiter = Arc::new(RateLimiter::per_minute(settings.rate_limit_per_minute));
        let cache = Arc::new(ResponseCache::new());
        Ok(Self::with_parts(settings, transport, limiter, cache))
    }

    /// Dependency-injection constructor for tests and composition roots
    /// that share a limiter or cache across clients.
    pub fn with_parts(
        settings: Settings,
        transport: Arc<dyn HttpTransport>,
        limiter: Arc<RateLimiter>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            settings,
            transport,
            limiter,
            cache,
        }
    }

    /// Perform one logical API call against `endpoint` with `params`.
    ///
    /// With `use_cache`, a fresh cached payload is returned without touching
    /// the limiter or the network, and the first successful payload is
    /// stored under the request fingerprint for the configured TTL.
    pub async fn request(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        use_cache: bool,
    ) -> Result<Value> {
        if use_cache {
            if let Some(payload) = self.cache.get(endpoint, params) {
                debug!(endpoint, "cache hit");
                return Ok(payload);
            }
        }

        if !self.limiter.can_make_request() {
            // Single wait sized by the limiter, then proceed regardless of a
            // re-check: the attempt below records its own slot either way.
            if let Some(wait) = self.limiter.wait_time() {
                if !wait.is_zero() {
                    warn!(
                        endpoint,
                        wait_secs = wait.as_secs_f64(),
                        "rate limit reached, waiting"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }

        let mut last_transient: Option<TransportError> = None;

        for attempt in 0..self.settings.max_retries {
            // Slot is consumed before the call goes out.
            self.limiter.add_request();
            debug!(endpoint, attempt = attempt + 1, "issuing upstream request");

            match self.transport.get(endpoint, params).await {
                Ok(response) => match response.status {
                    200 => return self.accept(endpoint, params, use_cache, response),
                    429 => {
                        let delay =
                            Duration::from_secs(THROTTLE_BACKOFF_SECS * u64::from(attempt + 1));
                        warn!(
                            endpoint,
                            attempt = attempt + 1,
                            delay_secs = delay.as_secs(),
                            "upstream throttled (429), backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    499 => return Err(PitchsideError::QuotaExceeded),
                    status => {
                        return Err(PitchsideError::Http {
                            status,
                            body: response.body,
                        })
                    }
                },
                Err(error) => {
                    let delay =
                        Duration::from_secs(TRANSIENT_BACKOFF_SECS * u64::from(attempt + 1));
                    warn!(
                        endpoint,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        %error,
                        "transport error, backing off"
                    );
                    last_transient = Some(error);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(PitchsideError::RetriesExhausted {
            attempts: self.settings.max_retries,
            last: last_transient,
        })
    }

    /// Classify a 200 response: application errors are fatal and never
    /// cached; clean payloads are cached (when requested) and returned.
    fn accept(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        use_cache: bool,
        response: RawResponse,
    ) -> Result<Value> {
        let payload: Value = serde_json::from_str(&response.body)?;

        if let Some(errors) = application_errors(&payload) {
            return Err(PitchsideError::Api(errors));
        }

        if use_cache {
            self.cache
                .set(endpoint, params, payload.clone(), self.settings.cache_ttl());
        }
        Ok(payload)
    }

    /// Read-only limiter snapshot for a monitoring endpoint.
    pub fn rate_limiter_stats(&self) -> RateLimiterStats {
        self.limiter.stats()
    }

    /// Read-only cache snapshot for a monitoring endpoint.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// The upstream reports business-level errors inside an otherwise-200 body
/// as `"errors": [...]` or `"errors": {...}`. Non-empty means error.
fn application_errors(payload: &Value) -> Option<String> {
    match payload.get("errors") {
        Some(Value::Array(items)) if !items.is_empty() => {
            Some(Value::Array(items.clone()).to_string())
        }
        Some(Value::Object(map)) if !map.is_empty() => {
            Some(Value::Object(map.clone()).to_string())
        }
        _ => None,
    }
}

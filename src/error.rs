//! Crate-wide error taxonomy.
//!
//! The orchestrator in [`crate::client`] is the only place that classifies
//! upstream failures into these variants; the cache and rate limiter never
//! raise. Callers match on the variant, not on message text.

use thiserror::Error;

use crate::transport::TransportError;

/// Convenient result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PitchsideError>;

/// Errors surfaced by the API-Football client.
#[derive(Debug, Error)]
pub enum PitchsideError {
    /// The upstream answered 200 but carried a business-level error payload.
    /// Never retried.
    #[error("API error: {0}")]
    Api(String),

    /// HTTP 499 — the plan's request quota is spent. Retrying cannot help;
    /// this is a structural capacity failure, not a flaky network.
    #[error("API quota exceeded. Please upgrade your plan.")]
    QuotaExceeded,

    /// Any non-200 status outside the handled 429/499 cases. The raw body is
    /// kept for diagnostics.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Every retry attempt failed on a transient error. `last` is `None`
    /// when all attempts were answered with an upstream 429.
    #[error("failed after {attempts} attempts; last error: {}", last_error_text(last))]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Option<TransportError>,
    },

    /// A 200 body that was not valid JSON.
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid settings value (bad numeric env var, malformed credential).
    #[error("configuration error: {0}")]
    Config(String),
}

fn last_error_text(last: &Option<TransportError>) -> String {
    match last {
        Some(error) => error.to_string(),
        None => "upstream throttling (429)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_names_attempt_count() {
        let err = PitchsideError::RetriesExhausted {
            attempts: 3,
            last: Some(TransportError::Timeout("deadline elapsed".into())),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempts"), "{text}");
        assert!(text.contains("deadline elapsed"), "{text}");
    }

    #[test]
    fn test_retries_exhausted_without_transport_cause() {
        let err = PitchsideError::RetriesExhausted {
            attempts: 2,
            last: None,
        };
        assert!(err.to_string().contains("429"), "{err}");
    }

    #[test]
    fn test_http_error_carries_status_and_body() {
        let err = PitchsideError::Http {
            status: 503,
            body: "upstream down".into(),
        };
        let text = err.to_string();
        assert!(text.contains("503"));
        assert!(text.contains("upstream down"));
    }
}

//! Resilient client for the API-Football upstream.
//!
//! Three pieces cooperate around a reqwest transport:
//! - a sliding-window [`RateLimiter`] that respects the per-minute quota,
//! - a TTL [`ResponseCache`] keyed by a request fingerprint,
//! - the [`FootballClient`] orchestrator composing cache lookup, throttle
//!   admission, bounded retries with linear backoff, and error
//!   classification into one call path.
//!
//! Everything is single-process and in-memory; there is no distributed
//! cache or limiter, and upstream data is returned as-is.

pub mod cache;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod limiter;
pub mod transport;

pub use cache::{CacheStats, ResponseCache};
pub use client::FootballClient;
pub use config::Settings;
pub use endpoints::{FixturesQuery, OddsQuery, PlayersQuery, TeamsQuery};
pub use error::{PitchsideError, Result};
pub use limiter::{RateLimiter, RateLimiterStats};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, TransportError};

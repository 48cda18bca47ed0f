//! Runtime settings for the upstream client.
//!
//! Loading is environment-based (`.env` supported via dotenvy) under the
//! variable names the deployment already uses. Every field has a default so
//! a bare environment still produces a usable `Settings` — except that an
//! empty `api_key` will be rejected by the upstream, not by us.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{PitchsideError, Result};

/// Production API-Football base URL.
pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";

/// Host the upstream expects in the `x-rapidapi-host` header.
pub const API_HOST: &str = "v3.football.api-sports.io";

/// Resolved configuration consumed by [`crate::client::FootballClient`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Credential sent as `x-rapidapi-key`.
    pub api_key: String,
    /// Upstream base URL; trailing slash is tolerated.
    pub base_url: String,
    /// Per-request transport timeout, in seconds.
    pub timeout_secs: u64,
    /// Cache TTL applied to every successful payload, in seconds.
    pub cache_ttl_secs: u64,
    /// Upper bound on attempts per logical call.
    pub max_retries: u32,
    /// Requests admitted per 60-second sliding window.
    pub rate_limit_per_minute: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            cache_ttl_secs: 3600,
            max_retries: 3,
            rate_limit_per_minute: 30,
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults.
    ///
    /// Recognised variables: `API_FOOTBALL_KEY`, `API_FOOTBALL_BASE_URL`,
    /// `API_FOOTBALL_TIMEOUT`, `CACHE_TTL`, `MAX_RETRIES`,
    /// `RATE_LIMIT_PER_MINUTE`. A present-but-unparseable numeric value is a
    /// hard error rather than a silent default.
    pub fn from_env() -> Result<Self> {
        // Best-effort .env load; a missing file is not an error.
        dotenvy::dotenv().ok();

        let mut settings = Self::default();
        if let Ok(value) = std::env::var("API_FOOTBALL_KEY") {
            settings.api_key = value;
        }
        if let Ok(value) = std::env::var("API_FOOTBALL_BASE_URL") {
            settings.base_url = value;
        }
        settings.timeout_secs = parse_env("API_FOOTBALL_TIMEOUT", settings.timeout_secs)?;
        settings.cache_ttl_secs = parse_env("CACHE_TTL", settings.cache_ttl_secs)?;
        settings.max_retries = parse_env("MAX_RETRIES", settings.max_retries)?;
        settings.rate_limit_per_minute =
            parse_env("RATE_LIMIT_PER_MINUTE", settings.rate_limit_per_minute)?;
        Ok(settings)
    }

    /// Per-request transport timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// TTL applied on every cache insertion.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| PitchsideError::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

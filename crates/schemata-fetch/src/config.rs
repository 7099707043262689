//! Retrieval configuration.
//!
//! Controls the HTTP client and the document cache. Defaults suit a
//! long-running service; override via environment variables or explicit
//! construction for tests.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Configuration for [`DocumentFetcher`](crate::DocumentFetcher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// How long a cached document stays fresh. `None` keeps entries forever.
    pub cache_ttl: Option<Duration>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Backoff for transient remote failures.
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            cache_ttl: None,
            user_agent: concat!("schemata/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `REGISTRY_TIMEOUT_SECS` (default: 30)
    /// - `REGISTRY_CACHE_TTL_SECS` (default: unset, no expiry; `0` also disables expiry)
    /// - `REGISTRY_MAX_RETRIES` (default: 3; `0` sends each request once)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout_secs = env_u64("REGISTRY_TIMEOUT_SECS")?.unwrap_or(defaults.timeout_secs);
        let cache_ttl = env_u64("REGISTRY_CACHE_TTL_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let retry = match env_u64("REGISTRY_MAX_RETRIES")? {
            Some(n) => RetryPolicy {
                max_retries: u32::try_from(n).unwrap_or(u32::MAX),
                ..defaults.retry
            },
            None => defaults.retry,
        };

        Ok(Self {
            timeout_secs,
            cache_ttl,
            retry,
            ..defaults
        })
    }
}

/// Read an optional non-negative integer from the environment. Blank counts as unset.
pub fn env_u64(var: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a non-negative integer, got '{1}'")]
    InvalidNumber(String, String),
}

//! Connection settings for an upstream adapter.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause after the upstream answers 429.
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(5);

/// Where an adapter connects and how patient it is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Scheme and host of the upstream, without a trailing slash.
    pub base_url: String,
    /// Bound on a single HTTP exchange, connect through body.
    pub timeout: Duration,
    /// Sleep applied after an HTTP 429 before the call gives up.
    pub rate_limit_cooldown: Duration,
}

impl ProviderSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    /// Join `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

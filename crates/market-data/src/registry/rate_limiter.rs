//! Minimum-interval rate limiter for a single upstream.
//!
//! Each upstream gets one limiter, shared by every caller that talks to it.
//! Grants form a single FIFO sequence and consecutive grants are never closer
//! than the configured interval. The limiter only delays; it never rejects.

use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::ProviderId;

/// Default spacing between requests to one upstream.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Rate limiter configuration for a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Minimum time between two granted slots.
    pub min_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

/// Self-throttle toward one upstream.
///
/// The last grant instant sits behind a `tokio::sync::Mutex`, which queues
/// waiters in arrival order. A caller keeps the lock while it sleeps out the
/// remaining interval, so the next caller measures its own wait from this
/// grant and never from a stale one.
pub struct RateLimiter {
    provider: ProviderId,
    config: RateLimitConfig,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the default interval.
    pub fn new(provider: impl Into<ProviderId>) -> Self {
        Self::with_config(provider, RateLimitConfig::default())
    }

    pub fn with_config(provider: impl Into<ProviderId>, config: RateLimitConfig) -> Self {
        Self {
            provider: provider.into(),
            config,
            last_grant: Mutex::new(None),
        }
    }

    /// Limiter that never delays, for upstreams with no self-imposed limit.
    pub fn unlimited(provider: impl Into<ProviderId>) -> Self {
        Self::with_config(
            provider,
            RateLimitConfig {
                min_interval: Duration::ZERO,
            },
        )
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn min_interval(&self) -> Duration {
        self.config.min_interval
    }

    /// Wait for the next slot, then take it.
    ///
    /// Returns immediately when the interval has already elapsed since the
    /// previous grant.
    pub async fn acquire(&self) {
        let mut last_grant = self.last_grant.lock().await;

        if let Some(previous) = *last_grant {
            let ready_at = previous + self.config.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    "Rate limiter: waiting {:?} for provider '{}'",
                    ready_at - now,
                    self.provider
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_grant = Some(Instant::now());
        debug!("Rate limiter: granted slot for '{}'", self.provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter(interval_ms: u64) -> RateLimiter {
        RateLimiter::with_config(
            "TEST_PROVIDER",
            RateLimitConfig {
                min_interval: Duration::from_millis(interval_ms),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let limiter = limiter(1000);
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_grants_are_spaced() {
        let limiter = limiter(250);
        let mut grants = Vec::new();
        for _ in 0..5 {
            limiter.acquire().await;
            grants.push(Instant::now());
        }

        for pair in grants.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(250));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_spaced() {
        let limiter = Arc::new(limiter(100));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut grants = Vec::new();
        for handle in handles {
            grants.push(handle.await.unwrap());
        }
        grants.sort();

        for pair in grants.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = limiter(100);
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlimited_never_waits() {
        let limiter = RateLimiter::unlimited("FREE");
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

//! Quote retrieval orchestration.
//!
//! The registry owns the single fallback order used for every payload:
//!
//! 1. fresh cache entry (only when the caller allows the cache)
//! 2. primary provider, with bounded retries and backoff
//! 3. secondary provider, once, when one is configured
//! 4. cached entry regardless of expiry
//! 5. failure, carrying the last error's text
//!
//! Live results are written back to the cache. No error escapes: every
//! call resolves to a [`RetrievalOutcome`].

use std::future::Future;
use std::sync::Arc;

use log::{debug, error, info, warn};

use super::{RetrievalOutcome, RetryPolicy};
use crate::cache::MarketCache;
use crate::errors::MarketDataError;
use crate::models::{HistoryRange, PriceHistory, Quote, QuoteSource, Symbol};
use crate::provider::MarketDataProvider;

/// Per-call switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    /// Serve a fresh cache entry without touching the network.
    pub use_cache: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

impl FetchOptions {
    /// Skip the cache fast path. The stale fallback still applies.
    pub fn live() -> Self {
        Self { use_cache: false }
    }
}

/// Payloads that record which step of the chain produced them.
trait Provenance {
    fn with_provenance(self, source: QuoteSource) -> Self;
}

impl Provenance for Quote {
    fn with_provenance(self, source: QuoteSource) -> Self {
        self.with_source(source)
    }
}

impl Provenance for PriceHistory {
    fn with_provenance(self, _source: QuoteSource) -> Self {
        self
    }
}

/// Orchestrates the primary and secondary providers around the shared cache.
pub struct QuoteRegistry {
    primary: Arc<dyn MarketDataProvider>,
    secondary: Option<Arc<dyn MarketDataProvider>>,
    cache: Arc<MarketCache>,
    retry: RetryPolicy,
}

impl QuoteRegistry {
    /// Create a registry with only a primary provider and the default retry
    /// policy.
    pub fn new(primary: Arc<dyn MarketDataProvider>, cache: Arc<MarketCache>) -> Self {
        Self {
            primary,
            secondary: None,
            cache,
            retry: RetryPolicy::default(),
        }
    }

    /// Enable the fallback provider.
    pub fn with_secondary(mut self, secondary: Arc<dyn MarketDataProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &Arc<MarketCache> {
        &self.cache
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Latest quote for `symbol`.
    ///
    /// A fresh cache hit comes back tagged [`QuoteSource::Cache`]; live quotes
    /// are tagged with the role of the provider that produced them.
    pub async fn get_quote(&self, symbol: &Symbol, options: FetchOptions) -> RetrievalOutcome<Quote> {
        let cache = &self.cache;
        self.retrieve(
            &format!("quote {}", symbol),
            options,
            || cache.lookup_quote(symbol).fresh(),
            |provider| {
                let symbol = symbol.clone();
                async move { provider.fetch_quote(&symbol).await }
            },
            |quote| cache.store_quote(quote),
            || cache.stale_quote(symbol),
        )
        .await
    }

    /// Daily series for `symbol` over `range`, cached with the history TTL.
    pub async fn get_history(
        &self,
        symbol: &Symbol,
        range: HistoryRange,
        options: FetchOptions,
    ) -> RetrievalOutcome<PriceHistory> {
        let cache = &self.cache;
        self.retrieve(
            &format!("history {} {}", symbol, range),
            options,
            || cache.lookup_history(symbol, range).fresh(),
            |provider| {
                let symbol = symbol.clone();
                async move { provider.fetch_history(&symbol, range).await }
            },
            |history| cache.store_history(history),
            || cache.stale_history(symbol, range),
        )
        .await
    }

    async fn retrieve<T, Fetch, Fut>(
        &self,
        label: &str,
        options: FetchOptions,
        fresh: impl FnOnce() -> Option<T>,
        fetch: Fetch,
        store: impl Fn(T),
        stale: impl FnOnce() -> Option<T>,
    ) -> RetrievalOutcome<T>
    where
        T: Provenance + Clone,
        Fetch: Fn(Arc<dyn MarketDataProvider>) -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        if options.use_cache {
            if let Some(value) = fresh() {
                debug!("Cache hit for {}", label);
                return RetrievalOutcome::cached(value.with_provenance(QuoteSource::Cache));
            }
        }

        let attempts = self.retry.attempts();
        let mut last_error: Option<MarketDataError> = None;

        for attempt in 0..attempts {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                debug!("Retrying {} in {:?}", label, delay);
                tokio::time::sleep(delay).await;
            }

            match fetch(self.primary.clone()).await {
                Ok(value) => {
                    let value = value.with_provenance(QuoteSource::Primary);
                    store(value.clone());
                    return RetrievalOutcome::live(value);
                }
                Err(e) => {
                    warn!(
                        "{} attempt {}/{} for {} failed: {}",
                        self.primary.id(),
                        attempt + 1,
                        attempts,
                        label,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        if let Some(secondary) = &self.secondary {
            info!("Falling back to {} for {}", secondary.id(), label);
            match fetch(secondary.clone()).await {
                Ok(value) => {
                    let value = value.with_provenance(QuoteSource::Secondary);
                    store(value.clone());
                    return RetrievalOutcome::live_with_warning(
                        value,
                        format!(
                            "Primary source {} unavailable; served by {}",
                            self.primary.id(),
                            secondary.id()
                        ),
                    );
                }
                Err(e) => {
                    warn!("{} fallback for {} failed: {}", secondary.id(), label, e);
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .unwrap_or(MarketDataError::AllProvidersFailed)
            .to_string();

        if let Some(value) = stale() {
            warn!("Serving stale cached {} ({})", label, reason);
            return RetrievalOutcome::stale(
                value.with_provenance(QuoteSource::Cache),
                format!("Live data unavailable ({}); serving cached data", reason),
            );
        }

        error!("No data for {}: {}", label, reason);
        RetrievalOutcome::failed(format!("{}: {}", MarketDataError::AllProvidersFailed, reason))
    }
}

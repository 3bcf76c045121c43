use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::clock::{Clock, SystemClock};
use super::ephemeral::{EphemeralCache, Lookup};
use crate::models::{HistoryRange, PriceHistory, Quote, Symbol};

/// Default TTL for latest quotes.
pub const DEFAULT_QUOTE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default TTL for daily series; past bars do not change intraday.
pub const DEFAULT_HISTORY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// TTL per cache key class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheTtls {
    pub quote: Duration,
    pub history: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            quote: DEFAULT_QUOTE_TTL,
            history: DEFAULT_HISTORY_TTL,
        }
    }
}

/// Cache key for a latest quote.
pub fn quote_key(symbol: &Symbol) -> String {
    format!("price:{}", symbol)
}

/// Cache key for a historical series.
pub fn history_key(symbol: &Symbol, range: HistoryRange) -> String {
    format!("history:{}:{}", symbol, range)
}

/// The process-wide market data cache.
///
/// Holds one [`EphemeralCache`] per payload class so each class keeps its
/// own TTL and value type.
pub struct MarketCache {
    quotes: EphemeralCache<Quote>,
    history: EphemeralCache<PriceHistory>,
    ttls: CacheTtls,
}

impl MarketCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self::with_clock(ttls, Arc::new(SystemClock))
    }

    pub fn with_clock(ttls: CacheTtls, clock: Arc<dyn Clock>) -> Self {
        Self {
            quotes: EphemeralCache::with_clock(clock.clone()),
            history: EphemeralCache::with_clock(clock),
            ttls,
        }
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    pub fn lookup_quote(&self, symbol: &Symbol) -> Lookup<Quote> {
        self.quotes.lookup(&quote_key(symbol))
    }

    pub fn stale_quote(&self, symbol: &Symbol) -> Option<Quote> {
        self.quotes.get_stale(&quote_key(symbol))
    }

    pub fn store_quote(&self, quote: Quote) {
        let key = quote_key(quote.symbol());
        debug!("Caching {} for {:?}", key, self.ttls.quote);
        self.quotes.set(key, quote, self.ttls.quote);
    }

    pub fn lookup_history(&self, symbol: &Symbol, range: HistoryRange) -> Lookup<PriceHistory> {
        self.history.lookup(&history_key(symbol, range))
    }

    pub fn stale_history(&self, symbol: &Symbol, range: HistoryRange) -> Option<PriceHistory> {
        self.history.get_stale(&history_key(symbol, range))
    }

    pub fn store_history(&self, history: PriceHistory) {
        let key = history_key(&history.symbol, history.range);
        debug!("Caching {} for {:?}", key, self.ttls.history);
        self.history.set(key, history, self.ttls.history);
    }

    /// Remove every expired entry in both classes.
    pub fn sweep_expired(&self) -> usize {
        self.quotes.sweep_expired() + self.history.sweep_expired()
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.quotes.len() + self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MarketCache {
    fn default() -> Self {
        Self::new(CacheTtls::default())
    }
}

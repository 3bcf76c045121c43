//! Market data provider trait definitions.
//!
//! This module defines the core `MarketDataProvider` trait that all
//! upstream adapters must implement.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{HistoryRange, PriceHistory, Quote, Symbol};

/// Trait for market data providers.
///
/// Implement this trait to add support for a new upstream. The registry
/// decides whether an adapter acts as the primary or the fallback source;
/// the adapter only knows how to talk to its own API.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tickerboard_market_data::provider::MarketDataProvider;
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
///         // ...
///     }
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO", "ALPHA_VANTAGE", etc.
    /// Used for logging and as the quote's `provider` field.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for a symbol.
    ///
    /// Must await the adapter's rate limiter before dispatching, and must
    /// fail rather than return a quote without a valid positive price.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError>;

    /// Fetch a daily OHLCV series covering `range`.
    ///
    /// Default implementation returns `NotSupported`.
    async fn fetch_history(
        &self,
        symbol: &Symbol,
        range: HistoryRange,
    ) -> Result<PriceHistory, MarketDataError> {
        let _ = (symbol, range);
        Err(MarketDataError::NotSupported {
            operation: "history".to_string(),
            provider: self.id().to_string(),
        })
    }
}

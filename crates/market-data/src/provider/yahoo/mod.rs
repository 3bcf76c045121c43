//! Yahoo Finance market data provider.
//!
//! Talks to the public chart API (`/v8/finance/chart/{symbol}`), which
//! serves both the latest regular-market price and daily OHLCV bars for
//! equities, ETFs, indices and FX pairs (e.g. `AAPL`, `SHOP.TO`, `^GSPC`,
//! `EURUSD=X`). This is the primary source.

mod models;

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::{
    Currency, HistoricalBar, HistoryRange, PriceHistory, Quote, Symbol, DEFAULT_CURRENCY,
};
use crate::provider::http::{build_client, send_text};
use crate::provider::numbers::positive_price;
use crate::provider::{MarketDataProvider, ProviderSettings};
use crate::registry::RateLimiter;

use models::{ChartResponse, ChartResult};

pub const PROVIDER_ID: &str = "YAHOO";

/// Default upstream host for the chart API.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// ============================================================================
// Yahoo Provider
// ============================================================================

/// Yahoo Finance market data provider.
///
/// Every request waits for a slot from the shared [`RateLimiter`] before it
/// is dispatched.
pub struct YahooProvider {
    client: Client,
    settings: ProviderSettings,
    limiter: Arc<RateLimiter>,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider.
    pub fn new(
        settings: ProviderSettings,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, MarketDataError> {
        let client = build_client(&settings)?;
        Ok(Self {
            client,
            settings,
            limiter,
        })
    }

    /// Fetch and decode the chart document for `symbol` over `range`.
    async fn fetch_chart(
        &self,
        symbol: &Symbol,
        range: HistoryRange,
    ) -> Result<ChartResponse, MarketDataError> {
        let url = self
            .settings
            .url(&format!("v8/finance/chart/{}", encode(symbol.as_str())));
        let request = self
            .client
            .get(&url)
            .query(&[("range", range.as_str()), ("interval", "1d")]);

        self.limiter.acquire().await;
        debug!("Fetching chart for {} ({}) from Yahoo", symbol, range);

        let body = send_text(PROVIDER_ID, &self.settings, request).await?;
        serde_json::from_str(&body).map_err(|e| MarketDataError::MalformedPayload {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse chart response: {}", e),
        })
    }
}

// ============================================================================
// Response mapping
// ============================================================================

/// Pull the single result out of a chart response.
fn first_result(symbol: &Symbol, response: ChartResponse) -> Result<ChartResult, MarketDataError> {
    if let Some(error) = response.chart.error {
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!(
                "{} for {}",
                error
                    .description
                    .or(error.code)
                    .unwrap_or_else(|| "chart error".to_string()),
                symbol
            ),
        });
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| MarketDataError::MalformedPayload {
            provider: PROVIDER_ID.to_string(),
            message: format!("empty chart result for {}", symbol),
        })
}

fn currency_of(result: &ChartResult) -> Currency {
    result
        .meta
        .currency
        .as_ref()
        .filter(|c| !c.trim().is_empty())
        .map(|c| Cow::Owned(c.trim().to_ascii_uppercase()))
        .unwrap_or(Cow::Borrowed(DEFAULT_CURRENCY))
}

/// Map a chart response to the latest quote.
///
/// A missing or non-positive `regularMarketPrice` is a failure; the quote is
/// never defaulted to zero.
fn quote_from_chart(symbol: &Symbol, response: ChartResponse) -> Result<Quote, MarketDataError> {
    let result = first_result(symbol, response)?;

    let price = result
        .meta
        .regular_market_price
        .and_then(positive_price)
        .ok_or_else(|| MarketDataError::MalformedPayload {
            provider: PROVIDER_ID.to_string(),
            message: format!("no valid regularMarketPrice for {}", symbol),
        })?;

    let observed_at = result
        .meta
        .regular_market_time
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Quote::new(
        symbol.clone(),
        price,
        currency_of(&result),
        Cow::Borrowed(PROVIDER_ID),
        observed_at,
    )
}

/// Map a chart response to daily bars, skipping sessions with a null close.
fn history_from_chart(
    symbol: &Symbol,
    range: HistoryRange,
    response: ChartResponse,
) -> Result<PriceHistory, MarketDataError> {
    let mut result = first_result(symbol, response)?;
    let currency = currency_of(&result);
    let offset = result.meta.gmtoffset.unwrap_or(0);

    let ohlcv = result
        .indicators
        .take()
        .and_then(|i| i.quote.into_iter().next())
        .unwrap_or_default();

    let bars: Vec<HistoricalBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let close = ohlcv.close.get(i).copied().flatten().and_then(positive_price)?;
            let local_ts = ts.checked_add(offset)?;
            let date = DateTime::<Utc>::from_timestamp(local_ts, 0)?.date_naive();
            let field = |values: &[Option<f64>]| {
                values
                    .get(i)
                    .copied()
                    .flatten()
                    .and_then(positive_price)
                    .unwrap_or(close)
            };
            let volume = ohlcv
                .volume
                .get(i)
                .copied()
                .flatten()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
                .unwrap_or(0);

            Some(HistoricalBar {
                date,
                open: field(&ohlcv.open),
                high: field(&ohlcv.high),
                low: field(&ohlcv.low),
                close,
                volume,
            })
        })
        .collect();

    if bars.is_empty() {
        warn!("No usable bars for '{}' over {}", symbol, range);
        return Err(MarketDataError::MalformedPayload {
            provider: PROVIDER_ID.to_string(),
            message: format!("no bars for {} over {}", symbol, range),
        });
    }

    Ok(PriceHistory::new(
        symbol.clone(),
        range,
        currency,
        Cow::Borrowed(PROVIDER_ID),
        bars,
    ))
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let response = self.fetch_chart(symbol, HistoryRange::OneDay).await?;
        quote_from_chart(symbol, response)
    }

    async fn fetch_history(
        &self,
        symbol: &Symbol,
        range: HistoryRange,
    ) -> Result<PriceHistory, MarketDataError> {
        let response = self.fetch_chart(symbol, range).await?;
        history_from_chart(symbol, range, response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    fn aapl() -> Symbol {
        Symbol::parse("AAPL").unwrap()
    }

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "AAPL",
                    "regularMarketPrice": 189.3,
                    "regularMarketTime": 1700000000,
                    "gmtoffset": -18000
                },
                "timestamp": [1699885800, 1699972200, 1700058600],
                "indicators": {
                    "quote": [{
                        "open": [184.8, 187.7, null],
                        "high": [186.0, 188.1, null],
                        "low": [184.2, 186.3, null],
                        "close": [184.8, 188.0, null],
                        "volume": [43627500, 60108400, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_quote_from_chart() {
        let quote = quote_from_chart(&aapl(), parse(CHART)).unwrap();
        assert_eq!(quote.price(), dec!(189.3));
        assert_eq!(quote.currency(), "USD");
        assert_eq!(quote.provider(), "YAHOO");
        assert_eq!(quote.observed_at().timestamp(), 1700000000);
    }

    #[test]
    fn test_missing_price_is_failure_not_zero() {
        let json = r#"{"chart":{"result":[{"meta":{"currency":"USD"}}],"error":null}}"#;
        assert!(matches!(
            quote_from_chart(&aapl(), parse(json)),
            Err(MarketDataError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_zero_price_is_failure() {
        let json = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":0.0}}],"error":null}}"#;
        assert!(quote_from_chart(&aapl(), parse(json)).is_err());
    }

    #[test]
    fn test_currency_defaults_to_usd() {
        let json = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":12.5}}],"error":null}}"#;
        let quote = quote_from_chart(&aapl(), parse(json)).unwrap();
        assert_eq!(quote.currency(), "USD");
    }

    #[test]
    fn test_chart_error_is_provider_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        match quote_from_chart(&aapl(), parse(json)) {
            Err(MarketDataError::ProviderError { message, .. }) => {
                assert!(message.contains("No data found"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_history_from_chart_skips_null_sessions() {
        let history = history_from_chart(&aapl(), HistoryRange::FiveDays, parse(CHART)).unwrap();
        assert_eq!(history.bars.len(), 2);
        assert_eq!(history.bars[0].close, dec!(184.8));
        assert_eq!(history.bars[1].volume, 60108400);
        assert_eq!(history.bars[0].date.to_string(), "2023-11-13");
        assert_eq!(history.range, HistoryRange::FiveDays);
    }

    #[test]
    fn test_history_without_bars_is_failure() {
        let json = r#"{"chart":{"result":[{"meta":{"currency":"USD"},"timestamp":[]}],"error":null}}"#;
        assert!(history_from_chart(&aapl(), HistoryRange::OneMonth, parse(json)).is_err());
    }

    #[test]
    fn test_out_of_range_timestamp_is_skipped() {
        let json = r#"{"chart":{"result":[{
            "meta":{"currency":"USD","gmtoffset":3600},
            "timestamp":[9223372036854775807, 1699885800],
            "indicators":{"quote":[{"close":[10.0, 11.0]}]}
        }],"error":null}}"#;

        let history = history_from_chart(&aapl(), HistoryRange::FiveDays, parse(json)).unwrap();

        assert_eq!(history.bars.len(), 1);
        assert_eq!(history.bars[0].close, dec!(11.0));
    }

    #[test]
    fn test_provider_id() {
        let provider = YahooProvider::new(
            ProviderSettings::new(DEFAULT_BASE_URL),
            Arc::new(RateLimiter::new(PROVIDER_ID)),
        )
        .unwrap();
        assert_eq!(provider.id(), "YAHOO");
    }
}

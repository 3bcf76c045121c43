//! Alpha Vantage market data provider implementation.
//!
//! This module provides market data from the Alpha Vantage API:
//! - Latest price via the GLOBAL_QUOTE endpoint
//! - Daily series via the TIME_SERIES_DAILY endpoint
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute, and it
//! reports throttling inside a 200 response rather than with HTTP 429.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{
    HistoricalBar, HistoryRange, PriceHistory, Quote, Symbol, DEFAULT_CURRENCY,
};
use crate::provider::http::{build_client, send_text};
use crate::provider::numbers::{parse_decimal, parse_positive_price};
use crate::provider::{MarketDataProvider, ProviderSettings};
use crate::registry::RateLimiter;

pub const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Default upstream host.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Key used when none is configured. Alpha Vantage serves a handful of
/// symbols for it, which is enough for a fallback path to be exercised.
pub const DEMO_API_KEY: &str = "demo";

/// Alpha Vantage market data provider.
///
/// Secondary source: the registry only reaches it after the primary has
/// exhausted its retries.
pub struct AlphaVantageProvider {
    client: Client,
    settings: ProviderSettings,
    api_key: String,
    limiter: Arc<RateLimiter>,
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// GLOBAL_QUOTE response
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// Unknown symbols come back as an empty object, so every field is optional.
#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
}

/// TIME_SERIES_DAILY response for equities
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyQuote>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyQuote {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

// ============================================================================
// AlphaVantageProvider implementation
// ============================================================================

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider.
    ///
    /// A missing or blank `api_key` falls back to [`DEMO_API_KEY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        settings: ProviderSettings,
        api_key: Option<String>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, MarketDataError> {
        let client = build_client(&settings)?;
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEMO_API_KEY.to_string());

        Ok(Self {
            client,
            settings,
            api_key,
            limiter,
        })
    }

    /// Make a request to the Alpha Vantage query endpoint.
    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        let request = self
            .client
            .get(self.settings.url("query"))
            .query(&all_params);

        self.limiter.acquire().await;
        // The key never reaches the log.
        debug!("Alpha Vantage request: {:?} apikey=***", params);

        send_text(PROVIDER_ID, &self.settings, request).await
    }
}

/// Check for API-level errors in the response.
///
/// Alpha Vantage answers throttled calls with HTTP 200 and a `Note` or
/// `Information` message instead of data; both count as rate limiting.
fn check_api_error(
    error_message: &Option<String>,
    note: &Option<String>,
    information: &Option<String>,
) -> Result<(), MarketDataError> {
    if let Some(ref msg) = error_message {
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: msg.clone(),
        });
    }

    if let Some(msg) = note.as_ref().or(information.as_ref()) {
        warn!("Alpha Vantage notice: {}", msg);
        return Err(MarketDataError::RateLimited {
            provider: PROVIDER_ID.to_string(),
        });
    }

    Ok(())
}

fn malformed(message: String) -> MarketDataError {
    MarketDataError::MalformedPayload {
        provider: PROVIDER_ID.to_string(),
        message,
    }
}

/// Map a GLOBAL_QUOTE body to a quote.
///
/// The endpoint carries no currency and only a trading date, so the quote is
/// stamped USD and observed now.
fn quote_from_global(symbol: &Symbol, body: &str) -> Result<Quote, MarketDataError> {
    let response: GlobalQuoteResponse = serde_json::from_str(body)
        .map_err(|e| malformed(format!("Failed to parse GLOBAL_QUOTE: {}", e)))?;

    check_api_error(
        &response.error_message,
        &response.note,
        &response.information,
    )?;

    let quote = response.global_quote.unwrap_or_default();
    if quote.symbol.is_none() && quote.price.is_none() {
        return Err(malformed(format!("empty Global Quote for {}", symbol)));
    }

    let price = quote
        .price
        .as_deref()
        .and_then(parse_positive_price)
        .ok_or_else(|| malformed(format!("no valid '05. price' for {}", symbol)))?;

    if let Some(day) = quote.latest_trading_day.as_deref() {
        debug!("Alpha Vantage price for {} as of {}", symbol, day);
    }

    Quote::new(
        symbol.clone(),
        price,
        Cow::Borrowed(DEFAULT_CURRENCY),
        Cow::Borrowed(PROVIDER_ID),
        Utc::now(),
    )
}

/// Map a TIME_SERIES_DAILY body to the bars that fall inside `range`.
fn history_from_series(
    symbol: &Symbol,
    range: HistoryRange,
    today: NaiveDate,
    body: &str,
) -> Result<PriceHistory, MarketDataError> {
    let response: TimeSeriesResponse = serde_json::from_str(body)
        .map_err(|e| malformed(format!("Failed to parse TIME_SERIES_DAILY: {}", e)))?;

    check_api_error(
        &response.error_message,
        &response.note,
        &response.information,
    )?;

    let series = response
        .time_series
        .ok_or_else(|| malformed(format!("no time series for {}", symbol)))?;
    let start = range.start_date(today);

    let bars: Vec<HistoricalBar> = series
        .into_iter()
        .filter_map(|(date_str, daily)| {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").ok()?;
            if start.is_some_and(|s| date < s) {
                return None;
            }
            let close = parse_positive_price(&daily.close)?;
            Some(HistoricalBar {
                date,
                open: parse_decimal(&daily.open).unwrap_or(close),
                high: parse_decimal(&daily.high).unwrap_or(close),
                low: parse_decimal(&daily.low).unwrap_or(close),
                close,
                volume: daily.volume.trim().parse().unwrap_or(0),
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(malformed(format!("no bars for {} over {}", symbol, range)));
    }

    Ok(PriceHistory::new(
        symbol.clone(),
        range,
        Cow::Borrowed(DEFAULT_CURRENCY),
        Cow::Borrowed(PROVIDER_ID),
        bars,
    ))
}

/// Compact output holds the last 100 sessions, enough for three months.
fn output_size(range: HistoryRange) -> &'static str {
    match range {
        HistoryRange::OneDay
        | HistoryRange::FiveDays
        | HistoryRange::OneMonth
        | HistoryRange::ThreeMonths => "compact",
        _ => "full",
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let body = self
            .fetch(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol.as_str())])
            .await?;
        quote_from_global(symbol, &body)
    }

    async fn fetch_history(
        &self,
        symbol: &Symbol,
        range: HistoryRange,
    ) -> Result<PriceHistory, MarketDataError> {
        let body = self
            .fetch(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol.as_str()),
                ("outputsize", output_size(range)),
            ])
            .await?;
        history_from_series(symbol, range, Utc::now().date_naive(), &body)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ibm() -> Symbol {
        Symbol::parse("IBM").unwrap()
    }

    #[test]
    fn test_global_quote_parsing() {
        let body = r#"{
            "Global Quote": {
                "01. symbol": "IBM",
                "02. open": "187.1500",
                "05. price": "189.2500",
                "07. latest trading day": "2024-01-05",
                "10. change percent": "0.4512%"
            }
        }"#;
        let quote = quote_from_global(&ibm(), body).unwrap();
        assert_eq!(quote.price(), dec!(189.25));
        assert_eq!(quote.currency(), "USD");
        assert_eq!(quote.provider(), "ALPHA_VANTAGE");
    }

    #[test]
    fn test_empty_global_quote_is_failure() {
        let body = r#"{"Global Quote": {}}"#;
        assert!(matches!(
            quote_from_global(&ibm(), body),
            Err(MarketDataError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_zero_price_is_failure() {
        let body = r#"{"Global Quote": {"01. symbol": "IBM", "05. price": "0.0000"}}"#;
        assert!(quote_from_global(&ibm(), body).is_err());
    }

    #[test]
    fn test_note_is_rate_limited() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        let err = quote_from_global(&ibm(), body).unwrap_err();
        assert!(matches!(err, MarketDataError::RateLimited { .. }));

        let body = r#"{"Information": "We have detected your API key as demo."}"#;
        assert!(matches!(
            quote_from_global(&ibm(), body).unwrap_err(),
            MarketDataError::RateLimited { .. }
        ));
    }

    #[test]
    fn test_error_message_is_provider_error() {
        let body = r#"{"Error Message": "Invalid API call. Please retry or visit the documentation."}"#;
        assert!(matches!(
            quote_from_global(&ibm(), body),
            Err(MarketDataError::ProviderError { .. })
        ));
    }

    #[test]
    fn test_history_filters_by_range() {
        let body = r#"{
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-03-15": {"1. open": "191.0", "2. high": "193.0", "3. low": "190.0", "4. close": "191.07", "5. volume": "8828184"},
                "2024-03-14": {"1. open": "196.9", "2. high": "197.0", "3. low": "192.0", "4. close": "193.43", "5. volume": "4207580"},
                "2023-12-29": {"1. open": "162.0", "2. high": "163.0", "3. low": "161.0", "4. close": "163.55", "5. volume": "3293000"}
            }
        }"#;
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let history = history_from_series(&ibm(), HistoryRange::FiveDays, today, body).unwrap();

        assert_eq!(history.bars.len(), 2);
        assert_eq!(history.bars[0].date.to_string(), "2024-03-14");
        assert_eq!(history.bars[1].close, dec!(191.07));
        assert_eq!(history.bars[1].volume, 8828184);

        let history = history_from_series(&ibm(), HistoryRange::Max, today, body).unwrap();
        assert_eq!(history.bars.len(), 3);
    }

    #[test]
    fn test_history_without_series_is_failure() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(history_from_series(&ibm(), HistoryRange::OneMonth, today, "{}").is_err());
    }

    #[test]
    fn test_output_size() {
        assert_eq!(output_size(HistoryRange::OneMonth), "compact");
        assert_eq!(output_size(HistoryRange::OneYear), "full");
    }

    #[test]
    fn test_blank_key_falls_back_to_demo() {
        let provider = AlphaVantageProvider::new(
            ProviderSettings::new(DEFAULT_BASE_URL),
            Some("  ".to_string()),
            Arc::new(RateLimiter::new(PROVIDER_ID)),
        )
        .unwrap();
        assert_eq!(provider.api_key, DEMO_API_KEY);
        assert_eq!(provider.id(), "ALPHA_VANTAGE");
    }
}

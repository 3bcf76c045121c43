//! Yahoo Finance chart API response models.
//!
//! The `/v8/finance/chart/{symbol}` endpoint carries both the latest price
//! (in `meta`) and the OHLCV arrays used for historical series.

use serde::Deserialize;

/// Top-level wrapper of the chart response
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

/// Error object Yahoo embeds in an otherwise well-formed body
#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub currency: Option<String>,
    pub symbol: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_time: Option<i64>,
    /// Exchange offset from UTC in seconds
    pub gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<IndicatorQuote>,
}

/// Parallel OHLCV arrays; any slot may be null on a halted session
#[derive(Debug, Default, Deserialize)]
pub struct IndicatorQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_meta() {
        let json = r#"{
            "currency": "USD",
            "symbol": "AAPL",
            "regularMarketPrice": 189.3,
            "regularMarketTime": 1700000000,
            "gmtoffset": -18000,
            "exchangeName": "NMS"
        }"#;
        let meta: ChartMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.currency.as_deref(), Some("USD"));
        assert_eq!(meta.regular_market_price, Some(189.3));
        assert_eq!(meta.gmtoffset, Some(-18000));
    }

    #[test]
    fn test_deserialize_error_body() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(response.chart.result.is_none());
        assert_eq!(
            response.chart.error.and_then(|e| e.code).as_deref(),
            Some("Not Found")
        );
    }

    #[test]
    fn test_deserialize_null_slots() {
        let json = r#"{"open":[1.0,null],"high":[2.0,null],"low":[0.5,null],"close":[1.5,null],"volume":[100,null]}"#;
        let quote: IndicatorQuote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.close, vec![Some(1.5), None]);
        assert_eq!(quote.volume, vec![Some(100.0), None]);
    }
}

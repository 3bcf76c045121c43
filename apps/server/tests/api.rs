use std::borrow::Cow;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tickerboard_market_data::{
    FundamentalsScraper, HistoricalBar, HistoryRange, MarketCache, MarketDataError,
    MarketDataProvider, PriceHistory, ProviderSettings, Quote, QuoteRegistry, RetryPolicy, Symbol,
};
use tickerboard_server::{api::app_router, config::Config, state_from_parts};
use tower::ServiceExt;

struct FakeProvider {
    id: &'static str,
    price: Option<Decimal>,
    calls: AtomicUsize,
}

impl FakeProvider {
    fn pricing(id: &'static str, price: Decimal) -> Arc<Self> {
        Arc::new(Self {
            id,
            price: Some(price),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(id: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            price: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn price_for(&self, symbol: &Symbol) -> Result<Decimal, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.price {
            // XYZ never resolves, whatever the upstream.
            Some(price) if symbol.as_str() != "XYZ" => Ok(price),
            _ => Err(MarketDataError::ProviderError {
                provider: self.id.to_string(),
                message: "HTTP 503".to_string(),
            }),
        }
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let price = self.price_for(symbol)?;
        Quote::new(
            symbol.clone(),
            price,
            Cow::Borrowed("USD"),
            Cow::Borrowed(self.id),
            Utc::now(),
        )
    }

    async fn fetch_history(
        &self,
        symbol: &Symbol,
        range: HistoryRange,
    ) -> Result<PriceHistory, MarketDataError> {
        let close = self.price_for(symbol)?;
        let bar = HistoricalBar {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        };
        Ok(PriceHistory::new(
            symbol.clone(),
            range,
            Cow::Borrowed("USD"),
            Cow::Borrowed(self.id),
            vec![bar],
        ))
    }
}

/// Upstream that answers only after `delay`.
struct SlowProvider {
    delay: Duration,
}

#[async_trait]
impl MarketDataProvider for SlowProvider {
    fn id(&self) -> &'static str {
        "SLOW"
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        tokio::time::sleep(self.delay).await;
        Quote::new(
            symbol.clone(),
            dec!(55),
            Cow::Borrowed("USD"),
            Cow::Borrowed("SLOW"),
            Utc::now(),
        )
    }
}

fn unreachable_scraper() -> Arc<FundamentalsScraper> {
    let settings =
        ProviderSettings::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500));
    Arc::new(FundamentalsScraper::new(settings).unwrap())
}

fn app_with(config: &Config, registry: QuoteRegistry) -> Router {
    let registry = registry.with_retry_policy(RetryPolicy::no_retry());
    let state = state_from_parts(config, Arc::new(registry), unreachable_scraper());
    app_router(state, config)
}

fn app(primary: Arc<FakeProvider>) -> Router {
    let registry = QuoteRegistry::new(primary, Arc::new(MarketCache::default()));
    app_with(&Config::default(), registry)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn healthz_works() {
    let app = app(FakeProvider::pricing("PRIMARY", dec!(1)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn quote_without_symbol_is_bad_request() {
    let primary = FakeProvider::pricing("PRIMARY", dec!(1));
    let app = app(primary.clone());

    let (status, body) = get(&app, "/api/v1/quote").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn invalid_symbol_never_reaches_upstream() {
    let primary = FakeProvider::pricing("PRIMARY", dec!(1));
    let app = app(primary.clone());

    let (status, _) = get(&app, "/api/v1/quote?symbol=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/v1/quote?symbol=BAD%20CODE!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn quote_is_served_then_cached() {
    let primary = FakeProvider::pricing("PRIMARY", dec!(187.25));
    let app = app(primary.clone());

    let (status, first) = get(&app, "/api/v1/quote?symbol=aapl").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["symbol"], "AAPL");
    assert_eq!(first["price"].as_f64(), Some(187.25));
    assert_eq!(first["currency"], "USD");
    assert_eq!(first["source"], "primary");
    assert_eq!(first["provider"], "PRIMARY");
    assert_eq!(first["cached"], false);
    assert!(first.get("warning").is_none());
    assert!(first["lastUpdated"].is_string());

    let (_, second) = get(&app, "/api/v1/quote?symbol=AAPL").await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["source"], "cache");
    assert_eq!(primary.calls(), 1);

    let (_, live) = get(&app, "/api/v1/quote?symbol=AAPL&cache=false").await;
    assert_eq!(live["cached"], false);
    assert_eq!(primary.calls(), 2);
}

#[tokio::test]
async fn secondary_answers_when_primary_fails() {
    let primary = FakeProvider::failing("PRIMARY");
    let secondary = FakeProvider::pricing("SECONDARY", dec!(101.5));
    let registry = QuoteRegistry::new(primary, Arc::new(MarketCache::default()))
        .with_secondary(secondary);
    let app = app_with(&Config::default(), registry);

    let (status, body) = get(&app, "/api/v1/quote?symbol=ACME&cache=false").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"].as_f64(), Some(101.5));
    assert_eq!(body["source"], "secondary");
    assert_eq!(body["cached"], false);
    assert!(!body["warning"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn total_failure_is_service_unavailable() {
    let primary = FakeProvider::failing("PRIMARY");
    let secondary = FakeProvider::failing("SECONDARY");
    let registry = QuoteRegistry::new(primary, Arc::new(MarketCache::default()))
        .with_secondary(secondary);
    let app = app_with(&Config::default(), registry);

    let (status, body) = get(&app, "/api/v1/quote?symbol=XYZ").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["symbol"], "XYZ");
    assert!(body["error"].is_string());
    assert!(!body["details"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn historical_rejects_unknown_range() {
    let primary = FakeProvider::pricing("PRIMARY", dec!(10));
    let app = app(primary.clone());

    let (status, _) = get(&app, "/api/v1/historical?symbol=AAPL&range=7w").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn historical_returns_series() {
    let app = app(FakeProvider::pricing("PRIMARY", dec!(42)));

    let (status, body) = get(&app, "/api/v1/historical?symbol=MSFT&range=6mo").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "MSFT");
    assert_eq!(body["range"], "6mo");
    assert_eq!(body["cached"], false);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["date"], "2024-03-01");
    assert_eq!(data[0]["close"].as_f64(), Some(42.0));
}

#[tokio::test]
async fn fundamentals_upstream_failure_is_bad_gateway() {
    let app = app(FakeProvider::pricing("PRIMARY", dec!(1)));

    let (status, body) = get(&app, "/api/v1/fundamentals?symbol=AAPL").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], 502);
}

#[tokio::test]
async fn valuation_keeps_succeeding_rows() {
    let app = app(FakeProvider::pricing("PRIMARY", dec!(200)));
    let body = r#"[
        {"stockName":"Apple","exchangeCode":"AAPL","sector":"Technology","quantity":10,"purchasePrice":150},
        {"stockName":"Unknown","exchangeCode":"XYZ","sector":"Other","quantity":5,"purchasePrice":10}
    ]"#;

    let (status, valuation) = post_json(&app, "/api/v1/holdings/valuate", body).await;

    assert_eq!(status, StatusCode::OK);
    let rows = valuation["holdings"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["exchangeCode"], "AAPL");
    assert_eq!(rows[0]["marketValue"].as_f64(), Some(2000.0));
    assert!(rows[0]["error"].is_null());
    assert!(rows[1]["marketValue"].is_null());
    assert!(rows[1]["error"].is_string());
    assert_eq!(valuation["totals"]["pricedCount"], 1);
    assert_eq!(valuation["totals"]["failedCount"], 1);
    assert_eq!(valuation["totals"]["marketValue"].as_f64(), Some(2000.0));
}

#[tokio::test]
async fn valuation_rejects_negative_quantity() {
    let app = app(FakeProvider::pricing("PRIMARY", dec!(200)));
    let body = r#"[{"stockName":"Apple","exchangeCode":"AAPL","quantity":-1,"purchasePrice":150}]"#;

    let (status, _) = post_json(&app, "/api/v1/holdings/valuate", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn holdings_without_document_is_not_found() {
    let app = app(FakeProvider::pricing("PRIMARY", dec!(1)));

    let (status, _) = get(&app, "/api/v1/holdings").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn holdings_document_is_valued() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(
        b"stockName,exchangeCode,sector,quantity,purchasePrice\nMicrosoft,MSFT,Technology,2,300\n",
    )
    .unwrap();

    let config = Config {
        holdings_path: Some(file.path().to_path_buf()),
        ..Config::default()
    };
    let registry = QuoteRegistry::new(
        FakeProvider::pricing("PRIMARY", dec!(400)),
        Arc::new(MarketCache::default()),
    );
    let app = app_with(&config, registry);

    let (status, valuation) = get(&app, "/api/v1/holdings").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(valuation["holdings"][0]["stockName"], "Microsoft");
    assert_eq!(valuation["totals"]["gain"].as_f64(), Some(200.0));
    assert_eq!(valuation["totals"]["gainPercent"].as_f64(), Some(33.33));
}

#[tokio::test]
async fn abandoned_request_still_caches_quote() {
    let cache = Arc::new(MarketCache::default());
    let provider = Arc::new(SlowProvider {
        delay: Duration::from_millis(300),
    });
    let registry = QuoteRegistry::new(provider, cache.clone());
    let app = app_with(&Config::default(), registry);

    let request = Request::builder()
        .uri("/api/v1/quote?symbol=AAPL")
        .body(Body::empty())
        .unwrap();
    let gave_up = tokio::time::timeout(Duration::from_millis(50), app.clone().oneshot(request))
        .await
        .is_err();
    assert!(gave_up);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(cache.len(), 1);

    let (status, body) = get(&app, "/api/v1/quote?symbol=AAPL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);
    assert_eq!(body["price"].as_f64(), Some(55.0));
}

//! Best-effort fundamentals scraped from the Yahoo Finance quote page.
//!
//! Values are read out of rendered HTML with regular expressions, so any of
//! them may be missing when the page layout shifts. Missing or unparsable
//! fields come back as `None`; only a failed page fetch is an error. Nothing
//! here is cached or retried.

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::Symbol;
use crate::provider::http::{build_client, send_text};
use crate::provider::ProviderSettings;

const PROVIDER_ID: &str = "YAHOO_QUOTE_PAGE";

/// Default page host.
pub const DEFAULT_BASE_URL: &str = "https://finance.yahoo.com";

// A label, then any run of tags, then the first text node.
lazy_static! {
    static ref PE_RATIO_REGEX: Regex =
        Regex::new(r"PE Ratio \(TTM\)\s*(?:</?[a-zA-Z][^>]*>\s*)+([^<]+)")
            .expect("Invalid regex pattern");
    static ref EPS_REGEX: Regex =
        Regex::new(r"EPS \(TTM\)\s*(?:</?[a-zA-Z][^>]*>\s*)+([^<]+)")
            .expect("Invalid regex pattern");
    static ref MARKET_CAP_REGEX: Regex =
        Regex::new(r"Market Cap(?: \(intraday\))?\s*(?:</?[a-zA-Z][^>]*>\s*)+([^<]+)")
            .expect("Invalid regex pattern");
    static ref DIVIDEND_REGEX: Regex =
        Regex::new(r"Forward Dividend (?:&amp;|&) Yield\s*(?:</?[a-zA-Z][^>]*>\s*)+([^<]+)")
            .expect("Invalid regex pattern");
    static ref YEAR_RANGE_REGEX: Regex =
        Regex::new(r"52 Week Range\s*(?:</?[a-zA-Z][^>]*>\s*)+([^<]+)")
            .expect("Invalid regex pattern");
    static ref PARENTHESIZED_REGEX: Regex =
        Regex::new(r"\(([^)]*)\)").expect("Invalid regex pattern");
}

/// Snapshot of headline valuation figures for one symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub symbol: String,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    /// Absolute amount, suffixes already expanded.
    pub market_cap: Option<f64>,
    /// Percent, e.g. `0.51` for 0.51%.
    pub dividend_yield: Option<f64>,
    pub year_high: Option<f64>,
    pub year_low: Option<f64>,
}

/// Fetches and scrapes quote pages.
pub struct FundamentalsScraper {
    client: Client,
    settings: ProviderSettings,
}

impl FundamentalsScraper {
    pub fn new(settings: ProviderSettings) -> Result<Self, MarketDataError> {
        let client = build_client(&settings)?;
        Ok(Self { client, settings })
    }

    /// Fetch the quote page for `symbol` and extract what it can.
    pub async fn fetch(&self, symbol: &Symbol) -> Result<Fundamentals, MarketDataError> {
        let url = self
            .settings
            .url(&format!("quote/{}/", encode(symbol.as_str())));
        debug!("Scraping fundamentals for {} from {}", symbol, url);

        let request = self.client.get(&url);
        let html = send_text(PROVIDER_ID, &self.settings, request).await?;
        Ok(parse(symbol, &html))
    }
}

/// Extract fundamentals from quote page HTML.
pub fn parse(symbol: &Symbol, html: &str) -> Fundamentals {
    let (year_low, year_high) = capture(&YEAR_RANGE_REGEX, html)
        .map(|raw| parse_range(&raw))
        .unwrap_or((None, None));

    Fundamentals {
        symbol: symbol.to_string(),
        pe_ratio: capture(&PE_RATIO_REGEX, html).and_then(|raw| parse_scaled(&raw)),
        eps: capture(&EPS_REGEX, html).and_then(|raw| parse_scaled(&raw)),
        market_cap: capture(&MARKET_CAP_REGEX, html).and_then(|raw| parse_scaled(&raw)),
        dividend_yield: capture(&DIVIDEND_REGEX, html).and_then(|raw| parse_yield(&raw)),
        year_high,
        year_low,
    }
}

fn capture(regex: &Regex, html: &str) -> Option<String> {
    regex
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Parse `1,234.5`, `2.87T`, `31.2M`, `0.51%`; `N/A` and `--` are absent.
fn parse_scaled(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    let value = cleaned.trim_end_matches('%').trim();
    if value.is_empty() || value.eq_ignore_ascii_case("N/A") || value == "--" {
        return None;
    }

    let (digits, multiplier) = match value.chars().last()? {
        'K' | 'k' => (&value[..value.len() - 1], 1e3),
        'M' => (&value[..value.len() - 1], 1e6),
        'B' => (&value[..value.len() - 1], 1e9),
        'T' => (&value[..value.len() - 1], 1e12),
        _ => (value, 1.0),
    };

    digits
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v * multiplier)
}

/// `0.96 (0.51%)` carries the yield in parentheses; a bare `0.51%` is
/// accepted too.
fn parse_yield(raw: &str) -> Option<f64> {
    match PARENTHESIZED_REGEX.captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => parse_scaled(inner.as_str()),
        None if raw.contains('%') => parse_scaled(raw),
        None => None,
    }
}

/// `164.08 - 199.62` into `(low, high)`.
fn parse_range(raw: &str) -> (Option<f64>, Option<f64>) {
    match raw.split_once(" - ") {
        Some((low, high)) => (parse_scaled(low), parse_scaled(high)),
        None => (None, None),
    }
}

//! Tickerboard Market Data Crate
//!
//! This crate provides quote retrieval with caching and fallback for the
//! Tickerboard dashboard.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Latest quotes and daily series from Yahoo Finance (primary)
//! - Fallback to Alpha Vantage (secondary)
//! - A process-wide TTL cache that doubles as a stale-data fallback
//! - Per-upstream rate limiting and bounded retries
//! - Best-effort fundamentals scraped from quote pages
//!
//! # Architecture
//!
//! ```text
//!                          +------------------+
//!                          |  QuoteRegistry   |  (fallback order, retries)
//!                          +------------------+
//!                           |        |       |
//!                           v        v       v
//!              +-------------+  +---------+  +-------------+
//!              | MarketCache |  | Primary |  |  Secondary  |
//!              +-------------+  +---------+  +-------------+
//!                                    |              |
//!                                    v              v
//!                             +-------------+ +-------------+
//!                             | RateLimiter | | RateLimiter |
//!                             +-------------+ +-------------+
//! ```
//!
//! # Core Types
//!
//! - [`Symbol`] - Validated ticker symbol
//! - [`Quote`] - Point-in-time price with provenance
//! - [`PriceHistory`] - Daily OHLCV series for a [`HistoryRange`]
//! - [`RetrievalOutcome`] - Value, cached flag, warning or error of one call
//!
//! # Type Aliases
//!
//! - [`ProviderId`] - Provider identifier (e.g., "YAHOO", "ALPHA_VANTAGE")
//! - [`Currency`] - Currency code (ISO 4217)

pub mod cache;
pub mod errors;
pub mod fundamentals;
pub mod models;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{
    Currency, HistoricalBar, HistoryRange, PriceHistory, ProviderId, Quote, QuoteSource, Symbol,
    DEFAULT_CURRENCY,
};

// Re-export cache types
pub use cache::{CacheTtls, Clock, ManualClock, MarketCache, SystemClock};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{MarketDataProvider, ProviderSettings};

// Re-export registry types
pub use registry::{
    Backoff, FetchOptions, QuoteRegistry, RateLimitConfig, RateLimiter, RetrievalOutcome,
    Retrieved, RetryPolicy,
};

// Re-export fundamentals
pub use fundamentals::{Fundamentals, FundamentalsScraper};

// Re-export error types
pub use errors::MarketDataError;

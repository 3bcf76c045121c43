//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `types` - Type aliases for common identifiers (ProviderId, Currency)
//! - `symbol` - Validated ticker symbol (Symbol)
//! - `quote` - Point-in-time price observation (Quote, QuoteSource)
//! - `history` - Daily OHLCV series (HistoricalBar, PriceHistory, HistoryRange)

mod history;
mod quote;
mod symbol;
mod types;

pub use history::{HistoricalBar, HistoryRange, PriceHistory};
pub use quote::{Quote, QuoteSource};
pub use symbol::Symbol;
pub use types::{Currency, ProviderId, DEFAULT_CURRENCY};

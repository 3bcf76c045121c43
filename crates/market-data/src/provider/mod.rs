//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that every upstream adapter implements
//! - Connection settings shared by the adapters
//! - The HTTP plumbing that turns transport failures into `MarketDataError`s
//! - Concrete adapters: Yahoo Finance (primary) and Alpha Vantage (secondary)
//!
//! Adapters own their failure handling. Whatever goes wrong on the wire
//! (timeout, 429, non-2xx, a payload without a price) comes back as an
//! `Err`, never as a panic and never as a zero-priced quote.

pub(crate) mod http;
mod numbers;
mod settings;
mod traits;

pub mod alpha_vantage;
pub mod yahoo;

pub use settings::{ProviderSettings, DEFAULT_RATE_LIMIT_COOLDOWN, DEFAULT_TIMEOUT};
pub use traits::MarketDataProvider;

//! Tickerboard Core - Holdings and portfolio valuation.
//!
//! This crate sits between the HTTP layer and the market data crate: it
//! reads the holdings document and prices every row through the shared
//! quote registry.

pub mod errors;
pub mod portfolio;

// Re-export common types from the portfolio module
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

//! Holdings module.
//!
//! Loads the user's holdings document and values it against live quotes.

mod holdings_loader;
mod holdings_model;
mod holdings_valuation_service;

pub use holdings_loader::*;
pub use holdings_model::*;
pub use holdings_valuation_service::*;

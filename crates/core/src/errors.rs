//! Core error types for the Tickerboard application.
//!
//! Quote retrieval never fails as a whole (failures are folded into each
//! valued row), so these errors only cover reading the holdings document.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the core crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read holdings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid holdings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid holdings CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported holdings format '{0}', expected .json or .csv")]
    UnsupportedFormat(String),

    #[error("Input validation failed: {0}")]
    Validation(String),
}

//! Error types for the market data crate.
//!
//! Every failure an adapter can hit is expressed as a [`MarketDataError`].
//! Adapters never let anything else escape; the retrieval registry only
//! records the error text and moves on to the next step of its fallback
//! chain, so callers never branch on the variant to decide what to do next.

use thiserror::Error;

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The symbol was empty or contained characters no upstream accepts.
    /// Raised before any adapter is reached.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The provider rate limited the request (HTTP 429 or an API notice).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred (non-2xx status, connection failure).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider answered, but the payload lacked the expected fields.
    #[error("Malformed payload from {provider}: {message}")]
    MalformedPayload {
        /// The provider that sent the payload
        provider: String,
        /// What was missing or unparsable
        message: String,
    },

    /// A value failed validation (e.g. a negative or non-finite price).
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// The provider does not implement the requested operation.
    #[error("{operation} not supported by {provider}")]
    NotSupported {
        /// Name of the operation
        operation: String,
        /// The provider lacking it
        provider: String,
    },

    /// All live sources were tried and all failed.
    #[error("All providers failed")]
    AllProvidersFailed,

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Convert a `reqwest` transport error into the adapter taxonomy,
    /// separating timeouts from every other failure.
    pub fn from_transport(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else {
            Self::ProviderError {
                provider: provider.to_string(),
                message: format!("Request failed: {}", err),
            }
        }
    }
}

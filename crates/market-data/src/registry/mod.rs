//! Provider registry module.
//!
//! This module provides orchestration for market data providers, including:
//! - Cache-first retrieval with primary and secondary fallback
//! - Rate limiting per upstream
//! - Bounded retries with backoff

mod outcome;
mod quote_registry;
mod rate_limiter;
mod retry_policy;

pub use outcome::{RetrievalOutcome, Retrieved};
pub use quote_registry::{FetchOptions, QuoteRegistry};
pub use rate_limiter::{RateLimitConfig, RateLimiter, DEFAULT_MIN_INTERVAL};
pub use retry_policy::{Backoff, RetryPolicy};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::symbol::Symbol;
use super::types::{Currency, ProviderId};
use crate::errors::MarketDataError;

/// Where a quote handed to a caller came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Primary,
    Secondary,
    Cache,
}

/// Point-in-time price observation for one symbol.
///
/// Fields are private so the price invariant (finite, never negative) can
/// only be established through [`Quote::new`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    symbol: Symbol,
    price: Decimal,
    currency: Currency,
    source: QuoteSource,
    /// Upstream that produced the observation (YAHOO, ALPHA_VANTAGE, ...)
    provider: ProviderId,
    observed_at: DateTime<Utc>,
}

impl Quote {
    /// Create a quote, rejecting negative prices.
    ///
    /// New quotes are tagged [`QuoteSource::Primary`]; the registry re-tags
    /// them with [`Quote::with_source`] according to the role of the adapter
    /// that produced them.
    pub fn new(
        symbol: Symbol,
        price: Decimal,
        currency: Currency,
        provider: ProviderId,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, MarketDataError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(MarketDataError::ValidationFailed {
                message: format!("negative price {} for {}", price, symbol),
            });
        }

        Ok(Self {
            symbol,
            price,
            currency,
            source: QuoteSource::Primary,
            provider,
            observed_at,
        })
    }

    /// Same observation with a different provenance tag.
    pub fn with_source(self, source: QuoteSource) -> Self {
        Self { source, ..self }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn source(&self) -> QuoteSource {
        self.source
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::errors::MarketDataError;

/// Longest ticker any supported upstream accepts.
const MAX_SYMBOL_LEN: usize = 32;

/// Exchange-qualified ticker symbol (e.g. `AAPL`, `RELIANCE.NS`, `^GSPC`).
///
/// Always trimmed, upper-cased and non-empty. Construction is the only
/// validation point, so anything holding a `Symbol` may hand it straight
/// to an adapter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Parse and normalize raw user input.
    pub fn parse(raw: &str) -> Result<Self, MarketDataError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MarketDataError::InvalidSymbol(
                "symbol must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_SYMBOL_LEN {
            return Err(MarketDataError::InvalidSymbol(format!(
                "symbol longer than {} characters",
                MAX_SYMBOL_LEN
            )));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_' | '&')))
        {
            return Err(MarketDataError::InvalidSymbol(format!(
                "unexpected character '{}' in {}",
                bad, trimmed
            )));
        }

        Ok(Self(Arc::from(trimmed.to_ascii_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

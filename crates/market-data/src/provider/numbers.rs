//! Number parsing shared by the adapters.

use std::str::FromStr;

use num_traits::FromPrimitive;
use rust_decimal::Decimal;

/// A usable price: finite and strictly positive.
pub(crate) fn positive_price(value: f64) -> Option<Decimal> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Decimal::from_f64(value).map(|d| d.normalize())
}

/// Parse a decimal that upstreams send as text, e.g. `"189.2500"`.
pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok()
}

/// Parse a textual price, requiring it to be strictly positive.
pub(crate) fn parse_positive_price(s: &str) -> Option<Decimal> {
    parse_decimal(s).filter(|d| d.is_sign_positive() && !d.is_zero())
}

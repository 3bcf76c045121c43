use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tickerboard_market_data::QuoteSource;

/// One line of the holdings document.
///
/// `exchange_code` is the ticker as the quote source knows it
/// (e.g. `AAPL`, `SHOP.TO`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub stock_name: String,
    pub exchange_code: String,
    #[serde(default)]
    pub sector: String,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
}

impl Holding {
    /// `None` when the product does not fit in a `Decimal`.
    pub fn cost_basis(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.purchase_price)
    }
}

/// A holding enriched with its latest quote.
///
/// Price-derived fields are `None` when no quote could be produced; `error`
/// then says why. Rows never fail each other.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuedHolding {
    #[serde(flatten)]
    pub holding: Holding,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub source: Option<QuoteSource>,
    pub cached: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub market_value: Option<Decimal>,
    pub cost_basis: Option<Decimal>,
    pub gain: Option<Decimal>,
    pub gain_percent: Option<Decimal>,
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl ValuedHolding {
    pub fn is_priced(&self) -> bool {
        self.market_value.is_some()
    }
}

/// Sums over the priced rows.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTotals {
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub gain: Decimal,
    pub gain_percent: Option<Decimal>,
    pub priced_count: usize,
    pub failed_count: usize,
}

/// Valuation response for a whole holdings list, rows in input order.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub holdings: Vec<ValuedHolding>,
    pub totals: PortfolioTotals,
    pub valued_at: DateTime<Utc>,
}

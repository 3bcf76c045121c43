use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tickerboard_market_data::{FetchOptions, QuoteRegistry, Symbol};

use super::holdings_model::{Holding, PortfolioTotals, PortfolioValuation, ValuedHolding};

#[async_trait]
pub trait HoldingsValuationServiceTrait: Send + Sync {
    /// Value every holding against its latest quote.
    ///
    /// Always returns one row per input holding, in input order. A row whose
    /// quote cannot be produced carries an error instead of a price.
    async fn valuate(&self, holdings: &[Holding]) -> PortfolioValuation;
}

#[derive(Clone)]
pub struct HoldingsValuationService {
    registry: Arc<QuoteRegistry>,
}

impl HoldingsValuationService {
    pub fn new(registry: Arc<QuoteRegistry>) -> Self {
        Self { registry }
    }

    async fn value_holding(&self, holding: &Holding) -> ValuedHolding {
        let cost_basis = holding.cost_basis();
        let mut row = ValuedHolding {
            holding: holding.clone(),
            price: None,
            currency: None,
            source: None,
            cached: false,
            last_updated: None,
            market_value: None,
            cost_basis,
            gain: None,
            gain_percent: None,
            warning: None,
            error: None,
        };

        // An unusable code fails the row before any upstream is touched.
        let symbol = match Symbol::parse(&holding.exchange_code) {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!("Skipping holding '{}': {}", holding.stock_name, e);
                row.error = Some(e.to_string());
                return row;
            }
        };

        let Some(cost_basis) = cost_basis else {
            warn!("Cost basis of {} overflows", symbol);
            row.error = Some(format!("Cost basis of {} is out of range", symbol));
            return row;
        };

        match self
            .registry
            .get_quote(&symbol, FetchOptions::default())
            .await
            .into_result()
        {
            Ok(retrieved) => {
                let quote = retrieved.value;
                row.price = Some(quote.price());
                row.currency = Some(quote.currency().to_string());
                row.source = Some(quote.source());
                row.cached = retrieved.cached;
                row.last_updated = Some(quote.observed_at());
                row.warning = retrieved.warning;

                let valued = holding
                    .quantity
                    .checked_mul(quote.price())
                    .and_then(|mv| mv.checked_sub(cost_basis).map(|gain| (mv, gain)));
                match valued {
                    Some((market_value, gain)) => {
                        row.market_value = Some(market_value);
                        row.gain = Some(gain);
                        row.gain_percent = gain_percent(gain, cost_basis);
                    }
                    None => {
                        warn!("Market value of {} overflows", symbol);
                        row.error = Some(format!("Market value of {} is out of range", symbol));
                    }
                }
            }
            Err(error) => {
                warn!("No quote for holding {}: {}", symbol, error);
                row.error = Some(error);
            }
        }

        row
    }
}

/// Gain as a percentage of cost, two decimal places. `None` without cost.
fn gain_percent(gain: Decimal, cost_basis: Decimal) -> Option<Decimal> {
    if cost_basis.is_zero() {
        return None;
    }
    gain.checked_div(cost_basis)?
        .checked_mul(dec!(100))
        .map(|pct| pct.round_dp(2))
}

/// Sum the priced rows. A row whose amounts would overflow the running
/// totals is marked failed instead.
fn totals(rows: &mut [ValuedHolding]) -> PortfolioTotals {
    let mut market_value = Decimal::ZERO;
    let mut cost_basis = Decimal::ZERO;
    let mut gain = Decimal::ZERO;
    let mut priced_count = 0;

    for row in rows.iter_mut().filter(|r| r.is_priced()) {
        match add_row((market_value, cost_basis, gain), row) {
            Some((mv, cost, g)) => {
                market_value = mv;
                cost_basis = cost;
                gain = g;
                priced_count += 1;
            }
            None => {
                warn!("Excluding {} from totals: sum out of range", row.holding.exchange_code);
                row.market_value = None;
                row.gain = None;
                row.gain_percent = None;
                row.error = Some("Portfolio totals out of range".to_string());
            }
        }
    }

    PortfolioTotals {
        market_value,
        cost_basis,
        gain,
        gain_percent: gain_percent(gain, cost_basis),
        priced_count,
        failed_count: rows.len() - priced_count,
    }
}

fn add_row(
    (market_value, cost_basis, gain): (Decimal, Decimal, Decimal),
    row: &ValuedHolding,
) -> Option<(Decimal, Decimal, Decimal)> {
    Some((
        market_value.checked_add(row.market_value?)?,
        cost_basis.checked_add(row.cost_basis?)?,
        gain.checked_add(row.gain?)?,
    ))
}

#[async_trait]
impl HoldingsValuationServiceTrait for HoldingsValuationService {
    async fn valuate(&self, holdings: &[Holding]) -> PortfolioValuation {
        debug!("Valuing {} holdings", holdings.len());

        let mut rows = join_all(holdings.iter().map(|h| self.value_holding(h))).await;
        let totals = totals(&mut rows);

        if totals.failed_count > 0 {
            warn!(
                "{} of {} holdings could not be priced",
                totals.failed_count,
                rows.len()
            );
        }

        PortfolioValuation {
            holdings: rows,
            totals,
            valued_at: Utc::now(),
        }
    }
}

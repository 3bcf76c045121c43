use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tickerboard_market_data::{FetchOptions, Quote, QuoteSource, Retrieved};

use super::{detached, parse_symbol};
use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
pub struct QuoteQuery {
    pub symbol: Option<String>,
    /// `false` forces a live fetch; the stale copy is still a fallback.
    pub cache: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub symbol: String,
    pub price: Decimal,
    pub currency: String,
    pub source: QuoteSource,
    pub provider: String,
    pub cached: bool,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<Retrieved<Quote>> for QuoteResponse {
    fn from(retrieved: Retrieved<Quote>) -> Self {
        let quote = retrieved.value;
        Self {
            symbol: quote.symbol().to_string(),
            price: quote.price(),
            currency: quote.currency().to_string(),
            source: quote.source(),
            provider: quote.provider().to_string(),
            cached: retrieved.cached,
            last_updated: quote.observed_at(),
            warning: retrieved.warning,
        }
    }
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Query(q): Query<QuoteQuery>,
) -> ApiResult<Json<QuoteResponse>> {
    let symbol = parse_symbol(q.symbol.as_deref())?;
    let options = FetchOptions {
        use_cache: q.cache.unwrap_or(true),
    };

    let registry = state.registry.clone();
    let task_symbol = symbol.clone();
    let outcome = detached(async move { registry.get_quote(&task_symbol, options).await }).await?;

    let retrieved = outcome
        .into_result()
        .map_err(|details| ApiError::Unavailable {
            error: "Unable to fetch quote".to_string(),
            details,
            symbol: symbol.to_string(),
        })?;

    if let Some(warning) = &retrieved.warning {
        tracing::warn!("Quote for {} served with warning: {}", symbol, warning);
    }
    Ok(Json(retrieved.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/quote", get(get_quote))
}

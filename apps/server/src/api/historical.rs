use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tickerboard_market_data::{
    FetchOptions, HistoricalBar, HistoryRange, PriceHistory, Retrieved,
};

use super::{detached, parse_symbol};
use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
pub struct HistoricalQuery {
    pub symbol: Option<String>,
    pub range: Option<String>,
}

#[derive(Serialize)]
pub struct HistoricalResponse {
    pub symbol: String,
    pub range: HistoryRange,
    pub currency: String,
    pub data: Vec<HistoricalBar>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<Retrieved<PriceHistory>> for HistoricalResponse {
    fn from(retrieved: Retrieved<PriceHistory>) -> Self {
        let history = retrieved.value;
        Self {
            symbol: history.symbol.to_string(),
            range: history.range,
            currency: history.currency.to_string(),
            data: history.bars,
            cached: retrieved.cached,
            warning: retrieved.warning,
        }
    }
}

async fn get_historical(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoricalQuery>,
) -> ApiResult<Json<HistoricalResponse>> {
    let symbol = parse_symbol(q.symbol.as_deref())?;
    let range = match q.range.as_deref() {
        Some(raw) => raw.parse::<HistoryRange>()?,
        None => HistoryRange::default(),
    };

    let registry = state.registry.clone();
    let task_symbol = symbol.clone();
    let outcome = detached(async move {
        registry
            .get_history(&task_symbol, range, FetchOptions::default())
            .await
    })
    .await?;

    let retrieved = outcome
        .into_result()
        .map_err(|details| ApiError::Unavailable {
            error: "Unable to fetch historical data".to_string(),
            details,
            symbol: symbol.to_string(),
        })?;

    Ok(Json(retrieved.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/historical", get(get_historical))
}

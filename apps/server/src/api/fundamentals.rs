use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tickerboard_market_data::Fundamentals;

use super::parse_symbol;
use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
pub struct FundamentalsQuery {
    pub symbol: Option<String>,
}

/// Best effort and never cached: figures the page lacks come back as null.
async fn get_fundamentals(
    State(state): State<Arc<AppState>>,
    Query(q): Query<FundamentalsQuery>,
) -> ApiResult<Json<Fundamentals>> {
    let symbol = parse_symbol(q.symbol.as_deref())?;
    let fundamentals = state.fundamentals.fetch(&symbol).await.map_err(|e| {
        tracing::warn!("Fundamentals for {} unavailable: {}", symbol, e);
        e
    })?;
    Ok(Json(fundamentals))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/fundamentals", get(get_fundamentals))
}

use std::sync::Arc;

use axum::{extract::State, Json};
use tickerboard_core::{load_holdings, validate_holdings, Holding, PortfolioValuation};

use crate::{
    api::detached,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

use super::dto::ValuateRequest;

/// Value the configured holdings document.
pub async fn get_holdings(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PortfolioValuation>> {
    let path = state
        .holdings_path
        .clone()
        .ok_or_else(|| ApiError::NotFound("No holdings document configured".to_string()))?;

    let holdings = tokio::task::spawn_blocking(move || load_holdings(&path))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(valuate(&state, holdings).await?))
}

/// Value a holdings list supplied by the caller.
pub async fn valuate_holdings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValuateRequest>,
) -> ApiResult<Json<PortfolioValuation>> {
    let holdings = validate_holdings(body.into_holdings())?;
    Ok(Json(valuate(&state, holdings).await?))
}

async fn valuate(state: &AppState, holdings: Vec<Holding>) -> ApiResult<PortfolioValuation> {
    let service = state.valuation_service.clone();
    detached(async move { service.valuate(&holdings).await }).await
}

mod fundamentals;
mod health;
mod historical;
mod holdings;
mod quotes;

use std::future::Future;
use std::sync::Arc;

use axum::{http::HeaderValue, Router};
use tickerboard_market_data::Symbol;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect::<Vec<HeaderValue>>();
        CorsLayer::new().allow_origin(origins)
    };

    let api = Router::new()
        .merge(health::router())
        .merge(quotes::router())
        .merge(historical::router())
        .merge(fundamentals::router())
        .merge(holdings::router());

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Validate a `symbol` query parameter before it can reach any upstream.
fn parse_symbol(raw: Option<&str>) -> ApiResult<Symbol> {
    let raw = raw.ok_or_else(|| ApiError::BadRequest("Missing symbol parameter".to_string()))?;
    Ok(Symbol::parse(raw)?)
}

/// Run `work` on its own task. Dropping the request (client gone, server
/// timeout) then leaves the upstream fetch and its cache write running.
async fn detached<F>(work: F) -> ApiResult<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Retrieval task failed: {}", e)))
}

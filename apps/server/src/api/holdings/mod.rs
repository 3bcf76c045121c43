mod dto;
mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::main_lib::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/holdings", get(handlers::get_holdings))
        .route("/holdings/valuate", post(handlers::valuate_holdings))
}

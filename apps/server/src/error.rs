use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tickerboard_core::errors::Error as CoreError;
use tickerboard_market_data::MarketDataError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    /// Every source, cached copies included, came up empty.
    #[error("{error}: {details}")]
    Unavailable {
        error: String,
        details: String,
        symbol: String,
    },
    /// A best-effort upstream (the fundamentals page) could not be fetched.
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

#[derive(Serialize)]
struct UnavailableBody {
    error: String,
    details: String,
    symbol: String,
}

impl From<MarketDataError> for ApiError {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::InvalidSymbol(_) | MarketDataError::ValidationFailed { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Unavailable {
                error,
                details,
                symbol,
            } => {
                let body = Json(UnavailableBody {
                    error,
                    details,
                    symbol,
                });
                return (StatusCode::SERVICE_UNAVAILABLE, body).into_response();
            }
            ApiError::Core(e) => match e {
                CoreError::Validation(_) | CoreError::Json(_) | CoreError::Csv(_) => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            },
            ApiError::NotFound(reason) => (StatusCode::NOT_FOUND, reason),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::Upstream(reason) => (StatusCode::BAD_GATEWAY, reason),
            ApiError::Internal(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason),
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

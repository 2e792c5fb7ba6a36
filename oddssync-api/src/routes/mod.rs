//! API route definitions

mod bets;
mod health;
mod markets;

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use oddssync_core::{FetchError, FieldError, MutationError};
use serde::Serialize;

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(markets::routes())
        .merge(bets::routes())
        .merge(health::routes())
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: Vec::new(),
        }
    }
}

fn error_response(status: StatusCode, body: ErrorResponse) -> axum::response::Response {
    (status, Json(body)).into_response()
}

pub fn fetch_error_response(e: &FetchError) -> axum::response::Response {
    let status = match e {
        FetchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        FetchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    };
    error_response(status, ErrorResponse::new(e.to_string()))
}

pub fn mutation_error_response(e: MutationError) -> axum::response::Response {
    match e {
        MutationError::Validation(fields) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorResponse {
                error: "Validation failed".to_string(),
                fields,
            },
        ),
        MutationError::Rejected(msg) => error_response(StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
        e @ (MutationError::Network(_) | MutationError::Parse(_)) => {
            error_response(StatusCode::BAD_GATEWAY, ErrorResponse::new(e.to_string()))
        }
    }
}

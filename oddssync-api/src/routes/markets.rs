//! Market list endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use oddssync_core::{FilterState, Market};
use oddssync_services::{RefreshOutcome, SyncStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{fetch_error_response, ErrorResponse};
use crate::AppState;

/// Raw filter selection as sent by the UI. Unknown values are ignored.
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub category: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

/// Query parameters for a payout quote
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub option_index: u32,
    pub amount: Decimal,
}

/// Current markets plus session status
#[derive(Debug, Serialize)]
pub struct MarketsResponse {
    pub markets: Vec<Market>,
    pub status: SyncStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub market_id: String,
    pub option_index: u32,
    pub amount: Decimal,
    pub potential_payout: Decimal,
}

/// Create market routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/markets", get(list_markets))
        .route("/markets/refresh", post(refresh_markets))
        .route("/markets/filter", put(set_filter))
        .route("/markets/page/{page}", put(set_page))
        .route("/markets/{id}", get(get_market))
        .route("/markets/{id}/quote", get(get_quote))
}

fn markets_response(state: &AppState) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(MarketsResponse {
            markets: state.sync.snapshot(),
            status: state.sync.status(),
        }),
    )
        .into_response()
}

fn refreshed(state: &AppState, outcome: RefreshOutcome) -> axum::response::Response {
    if let RefreshOutcome::Applied {
        market_count,
        total_count,
    } = outcome
    {
        debug!("Refresh applied: {} of {} markets", market_count, total_count);
    }
    markets_response(state)
}

/// Current snapshot, in display order
async fn list_markets(State(state): State<AppState>) -> impl IntoResponse {
    markets_response(&state)
}

/// Refetch the current filter and page
async fn refresh_markets(State(state): State<AppState>) -> impl IntoResponse {
    match state.sync.refresh().await {
        Ok(outcome) => refreshed(&state, outcome),
        Err(e) => fetch_error_response(&e),
    }
}

async fn set_filter(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> impl IntoResponse {
    let filter = FilterState::from_raw(
        request.category.as_deref(),
        request.status.as_deref(),
        request.sort.as_deref(),
        request.search.as_deref(),
    );
    info!("Setting filter: {:?}", filter);

    match state.sync.set_filter(filter).await {
        Ok(outcome) => refreshed(&state, outcome),
        Err(e) => fetch_error_response(&e),
    }
}

async fn set_page(State(state): State<AppState>, Path(page): Path<u32>) -> impl IntoResponse {
    match state.sync.set_page(page).await {
        Ok(outcome) => refreshed(&state, outcome),
        Err(e) => fetch_error_response(&e),
    }
}

async fn get_market(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.sync.market(&id) {
        Some(market) => (StatusCode::OK, Json(market)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Market not found: {}", id))),
        )
            .into_response(),
    }
}

/// Payout for a prospective bet at the current local odds
async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<QuoteQuery>,
) -> impl IntoResponse {
    match state.betting.quote(&id, query.option_index, query.amount) {
        Some(potential_payout) => (
            StatusCode::OK,
            Json(QuoteResponse {
                market_id: id,
                option_index: query.option_index,
                amount: query.amount,
                potential_payout,
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "No odds for option {} of market {}",
                query.option_index, id
            ))),
        )
            .into_response(),
    }
}

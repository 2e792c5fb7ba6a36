//! Contract mutation endpoints (create, bet, resolve, liquidity)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use oddssync_core::{
    AddLiquidityParams, CreateMarketParams, PlaceBetParams, ResolveMarketParams,
    TransactionReceipt,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use super::mutation_error_response;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetRequest {
    pub option_index: u32,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub winning_option: u32,
    #[serde(default)]
    pub resolution_data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LiquidityRequest {
    pub amount: Decimal,
}

/// Create contract routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/markets", post(create_market))
        .route("/markets/{id}/bets", post(place_bet))
        .route("/markets/{id}/resolve", post(resolve_market))
        .route("/markets/{id}/liquidity", post(add_liquidity))
}

fn submitted(receipt: TransactionReceipt) -> axum::response::Response {
    (StatusCode::OK, Json(receipt)).into_response()
}

async fn create_market(
    State(state): State<AppState>,
    Json(params): Json<CreateMarketParams>,
) -> impl IntoResponse {
    info!("Creating market: {}", params.description);

    match state.betting.create_market(params).await {
        Ok(receipt) => submitted(receipt),
        Err(e) => {
            error!("Failed to create market: {}", e);
            mutation_error_response(e)
        }
    }
}

async fn place_bet(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Json(request): Json<PlaceBetRequest>,
) -> impl IntoResponse {
    let params = PlaceBetParams {
        market_id,
        option_index: request.option_index,
        amount: request.amount,
    };
    info!(
        "Placing bet of {} on market {} option {}",
        params.amount, params.market_id, params.option_index
    );

    match state.betting.place_bet(params).await {
        Ok(receipt) => submitted(receipt),
        Err(e) => {
            error!("Failed to place bet: {}", e);
            mutation_error_response(e)
        }
    }
}

async fn resolve_market(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> impl IntoResponse {
    let params = ResolveMarketParams {
        market_id,
        winning_option: request.winning_option,
        resolution_data: request.resolution_data,
    };

    match state.betting.resolve_market(params).await {
        Ok(receipt) => submitted(receipt),
        Err(e) => {
            error!("Failed to resolve market: {}", e);
            mutation_error_response(e)
        }
    }
}

async fn add_liquidity(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Json(request): Json<LiquidityRequest>,
) -> impl IntoResponse {
    let params = AddLiquidityParams {
        market_id,
        amount: request.amount,
    };

    match state.betting.add_liquidity(params).await {
        Ok(receipt) => submitted(receipt),
        Err(e) => {
            error!("Failed to add liquidity: {}", e);
            mutation_error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn post_json(uri: &str, body: &str) -> (StatusCode, Value) {
        let app = crate::app(test_support::state().await);
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_place_bet() {
        let (status, body) = post_json("/api/markets/1/bets", r#"{"optionIndex":0,"amount":"25"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transactionId"], "0xbet");
    }

    #[tokio::test]
    async fn test_bet_validation_errors_list_fields() {
        let (status, body) = post_json("/api/markets/1/bets", r#"{"optionIndex":4,"amount":"0.5"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["amount", "optionIndex"]);
    }

    #[tokio::test]
    async fn test_rejected_bet() {
        let (status, body) = post_json("/api/markets/1/bets", r#"{"optionIndex":1,"amount":"600"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "insufficient balance");
    }

    #[tokio::test]
    async fn test_create_market() {
        let (status, body) = post_json(
            "/api/markets",
            r#"{"description":"Will it snow?","options":["Yes","No"],"initialLiquidity":"100"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transactionId"], "0xcreate");
    }

    #[tokio::test]
    async fn test_resolve_and_liquidity() {
        let (status, _) = post_json("/api/markets/2/resolve", r#"{"winningOption":1}"#).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json("/api/markets/2/liquidity", r#"{"amount":"50"}"#).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Network error: connection reset");
    }
}

//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use oddssync_services::{ConnectionHealth, LoadState};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Reachability of the GraphQL HTTP endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointHealth {
    url: String,
    reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    graphql: EndpointHealth,
    subscription: ConnectionHealth,
    load_state: LoadState,
    market_count: usize,
}

/// Health check handler. Degraded while the GraphQL endpoint is unreachable
/// or the update subscription is down.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let network = state.graphql.check_network_status().await;
    if let Err(e) = &network {
        warn!("[Health] GraphQL endpoint unreachable: {}", e);
    }
    let graphql = EndpointHealth {
        url: state.graphql.http_url().to_string(),
        reachable: network.is_ok(),
        error: network.err().map(|e| e.to_string()),
    };

    let subscription = state.sync.connection_health();
    let status = state.sync.status();

    let healthy = graphql.reachable && subscription.connected;
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        graphql,
        subscription,
        load_state: status.load_state,
        market_count: status.market_count,
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_degraded_when_upstream_down() {
        let app = crate::app(test_support::state().await);
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["marketCount"], 2);
        assert_eq!(body["graphql"]["url"], "http://127.0.0.1:1/graphql");
        assert_eq!(body["graphql"]["reachable"], false);
        assert!(body["graphql"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_liveness() {
        let app = crate::app(test_support::state().await);
        let response = app
            .oneshot(Request::get("/api/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

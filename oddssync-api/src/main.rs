//! Oddssync API Server
//!
//! HTTP front for one market sync session: serves the synced market list
//! and forwards contract mutations to the GraphQL service.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use oddssync_graphql::{GraphQlClient, GraphQlWsConnector};
use oddssync_services::{BettingService, MarketSync, RefreshOutcome, SyncConfig};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub graphql: Arc<GraphQlClient>,
    pub sync: Arc<MarketSync>,
    pub betting: Arc<BettingService>,
}

/// Build the full router for a given state
pub fn app(state: AppState) -> Router {
    // Configure CORS for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,oddssync_api=debug")),
        )
        .init();

    info!("Starting Oddssync API");

    let config = SyncConfig::from_env()?;
    info!(
        "GraphQL endpoints: {} (queries), {} (subscriptions)",
        config.http_url, config.ws_url
    );
    if config.auth_token.is_none() {
        info!("No ODDSSYNC_AUTH_TOKEN set - requests will be unauthenticated");
    }

    let client = Arc::new(GraphQlClient::with_timeout(
        &config.http_url,
        config.auth_token.clone(),
        config.request_timeout(),
    )?);
    let connector = Arc::new(GraphQlWsConnector::new(
        config.ws_url.clone(),
        config.auth_token.clone(),
    ));

    // The same connector hands out the per-market liveOdds subscriptions
    let sync = Arc::new(
        MarketSync::new(client.clone(), connector.clone(), &config).with_odds_feed(connector),
    );
    let betting = Arc::new(BettingService::new(client.clone(), sync.clone()));

    // Start the update subscription and load the first page. A failed first
    // fetch is not fatal; the subscription keeps running and clients can
    // refresh.
    match sync.start().await {
        Ok(RefreshOutcome::Applied {
            market_count,
            total_count,
        }) => info!("Loaded {} of {} markets", market_count, total_count),
        Ok(RefreshOutcome::Superseded) => {}
        Err(e) => warn!("Initial market fetch failed: {}", e),
    }

    let app = app(AppState {
        graphql: client,
        sync: sync.clone(),
        betting,
    });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sync.stop();
    info!("Oddssync API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

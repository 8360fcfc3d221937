//! parley-gateway server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay endpoint and the
//! REST observability endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use parley_gateway::api;
use parley_gateway::app_state::AppState;
use parley_gateway::config::GatewayConfig;
use parley_gateway::service::RelayService;
use parley_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting parley-gateway");

    // Build the relay service
    let relay = Arc::new(RelayService::new(
        config.history_capacity,
        config.ring_timeout,
    ));

    // Build application state
    let app_state = AppState { relay };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Routes `/agents/{session}` to the WebSocket handler, serves a liveness
//! endpoint, and answers everything else with 404.

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use confab_core::ConfabError;

use crate::registry::SessionRegistry;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Session router: one persistent agent per session id.
    pub registry: Arc<SessionRegistry>,
}

/// Gateway server options (mirrors ServerConfig from confab-config).
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Builds the gateway router over the given state.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/agents/{session}", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP/WebSocket server.
///
/// Binds to the configured host:port and serves until the cancellation
/// token fires, then shuts down gracefully.
pub async fn start_server(
    options: &ServerOptions,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), ConfabError> {
    let app = build_router(state);

    let addr = format!("{}:{}", options.host, options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ConfabError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ConfabError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

/// Liveness endpoint.
async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

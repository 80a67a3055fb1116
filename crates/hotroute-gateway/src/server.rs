// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host HTTP server built on axum.
//!
//! Fixed routes serve health and introspection; everything else falls
//! through to the plugin route table.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use hotroute_core::HotrouteError;
use hotroute_plugin::{HOST_HEALTH_PATH, HOST_ROUTE_PREFIX};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::registry::Registry;

/// Default request body limit (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<Registry>,
    pub health: HealthState,
    /// Use `X-Forwarded-For` for client identity.
    pub trust_proxy_headers: bool,
    /// Largest request body read for a plugin, in bytes.
    pub body_limit: usize,
}

impl GatewayState {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            health: HealthState {
                start_time: std::time::Instant::now(),
            },
            trust_proxy_headers: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

/// Host server configuration (mirrors `ServerConfig` from hotroute-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the application router.
///
/// Plugins cannot claim these host paths; descriptor validation rejects them.
///
/// - GET /health
/// - GET /_hotroute/endpoints
/// - GET /_hotroute/stats
/// - GET /_hotroute/health
/// - anything else: plugin dispatch
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(HOST_HEALTH_PATH, get(handlers::get_public_health))
        .route(&format!("{HOST_ROUTE_PREFIX}/endpoints"), get(handlers::list_endpoints))
        .route(&format!("{HOST_ROUTE_PREFIX}/stats"), get(handlers::get_stats))
        .route(&format!("{HOST_ROUTE_PREFIX}/health"), get(handlers::get_plugin_health))
        .fallback(handlers::dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), HotrouteError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HotrouteError::Server {
            message: format!("failed to bind to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("hotroute listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await
    .map_err(|e| HotrouteError::Server {
        message: format!("server error: {e}"),
        source: Some(Box::new(e)),
    })?;

    tracing::info!("hotroute server stopped");
    Ok(())
}

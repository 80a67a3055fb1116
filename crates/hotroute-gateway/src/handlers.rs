// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP handlers: host health, registry introspection, and plugin dispatch.
//!
//! Handles GET /health, GET /_hotroute/{endpoints,stats,health}, and every
//! other request through the route table.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::str::FromStr;

use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hotroute_core::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::guard::IncomingRequest;
use crate::metadata::{EndpointFilter, EndpointMetadata, PluginHealth, RegistryStats, SortField};
use crate::ratelimit::client_identity;
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body for introspection endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query string for GET /_hotroute/endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct EndpointQuery {
    pub method: Option<String>,
    pub authentication: Option<bool>,
    pub tag: Option<String>,
    pub deprecated: Option<bool>,
    pub sort: Option<String>,
}

impl EndpointQuery {
    /// Convert to a registry filter, rejecting unknown methods and sort fields.
    pub fn into_filter(self) -> Result<EndpointFilter, String> {
        let method = self
            .method
            .as_deref()
            .map(|m| HttpMethod::from_str(m).map_err(|_| format!("unsupported method `{m}`")))
            .transpose()?;
        let sort = self
            .sort
            .as_deref()
            .map(|s| SortField::from_str(s).map_err(|_| format!("unsupported sort field `{s}`")))
            .transpose()?
            .unwrap_or_default();
        Ok(EndpointFilter {
            method,
            authentication: self.authentication,
            tag: self.tag,
            deprecated: self.deprecated,
            sort,
        })
    }
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /_hotroute/endpoints
pub async fn list_endpoints(
    State(state): State<GatewayState>,
    Query(query): Query<EndpointQuery>,
) -> Result<Json<Vec<EndpointMetadata>>, (StatusCode, Json<ErrorResponse>)> {
    let filter = query
        .into_filter()
        .map_err(|error| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })))?;
    Ok(Json(state.registry.list_endpoints(&filter).await))
}

/// GET /_hotroute/stats
pub async fn get_stats(State(state): State<GatewayState>) -> Json<RegistryStats> {
    Json(state.registry.stats().await)
}

/// GET /_hotroute/health
pub async fn get_plugin_health(
    State(state): State<GatewayState>,
) -> Json<BTreeMap<String, PluginHealth>> {
    Json(state.registry.aggregate_health().await)
}

/// Fallback: route the request to the plugin mounted at its method and path.
pub async fn dispatch(State(state): State<GatewayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let Some((method, guard)) = HttpMethod::from_str(parts.method.as_str())
        .ok()
        .and_then(|m| state.registry.routes().resolve(m, &path).map(|g| (m, g)))
    else {
        return not_found(&path);
    };

    let (query, query_error) = match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
        Ok(Query(query)) => (query, None),
        Err(e) => {
            debug!(path = %path, error = %e, "query string could not be decoded");
            (HashMap::new(), Some(e.body_text()))
        }
    };
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_id = client_identity(remote_addr, &parts.headers, state.trust_proxy_headers);

    let body = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "error": "Request body too large",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            )
                .into_response();
        }
    };

    guard
        .handle(IncomingRequest {
            method,
            path,
            query,
            query_error,
            headers: parts.headers,
            body,
            client_id,
        })
        .await
}

fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not found",
            "path": path,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_query_converts_to_filter() {
        let query = EndpointQuery {
            method: Some("post".into()),
            authentication: Some(true),
            tag: Some("admin".into()),
            deprecated: None,
            sort: Some("name".into()),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.method, Some(HttpMethod::Post));
        assert_eq!(filter.authentication, Some(true));
        assert_eq!(filter.tag.as_deref(), Some("admin"));
        assert_eq!(filter.sort, SortField::Name);
    }

    #[test]
    fn endpoint_query_rejects_unknown_values() {
        let bad_method = EndpointQuery {
            method: Some("TRACE".into()),
            ..Default::default()
        };
        assert!(bad_method.into_filter().unwrap_err().contains("TRACE"));

        let bad_sort = EndpointQuery {
            sort: Some("size".into()),
            ..Default::default()
        };
        assert!(bad_sort.into_filter().unwrap_err().contains("size"));
    }

    #[test]
    fn health_response_is_camel_case() {
        let json = serde_json::to_value(HealthResponse {
            status: "ok".into(),
            version: "0.1.0".into(),
            uptime_secs: 5,
        })
        .unwrap();
        assert_eq!(json["uptimeSecs"], 5);
    }
}

// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-plugin request guard pipeline.
//!
//! Every request routed to a plugin passes, in order:
//!
//! 1. authentication (plugins with `authentication = true`)
//! 2. parameter validation (query string for GET, JSON body otherwise)
//! 3. rate limiting (plugins with a `rate_limit`)
//! 4. execution bounded by the plugin's `timeout_ms`
//!
//! The first failing stage short-circuits with a [`GuardRejection`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hotroute_core::{
    HotrouteError, HttpMethod, PluginHandler, PluginRequest, PluginResponse, ResponseBody,
};
use hotroute_plugin::PluginDescriptor;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::AuthConfig;
use crate::params::{compile_rules, validate_params, CompiledRule};
use crate::ratelimit::{RateLimitDecision, RateLimiter};

/// Request-time failures, each mapped to an HTTP response.
#[derive(Debug, Error)]
pub enum GuardRejection {
    #[error("Authentication required")]
    AuthMissing,

    #[error("Invalid authorization header format. Expected: Bearer <token>")]
    AuthMalformed,

    #[error("Invalid token")]
    AuthInvalid,

    #[error("Validation failed")]
    ValidationFailed { details: Vec<String> },

    #[error("Too many requests")]
    RateLimited { retry_after_secs: u64 },

    /// The handler did not finish in time. It keeps running in the background.
    #[error("execution timed out after {timeout_ms} ms")]
    ExecutionTimeout { error_id: String, timeout_ms: u64 },

    /// The handler returned an error or panicked.
    #[error("execution failed: {message}")]
    ExecutionFailure { error_id: String, message: String },
}

impl GuardRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthMissing | Self::AuthMalformed => StatusCode::UNAUTHORIZED,
            Self::AuthInvalid => StatusCode::FORBIDDEN,
            Self::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ExecutionTimeout { .. } | Self::ExecutionFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339();
        match self {
            Self::ValidationFailed { details } => json!({
                "error": self.to_string(),
                "details": details,
                "timestamp": timestamp,
            }),
            Self::RateLimited { retry_after_secs } => json!({
                "error": self.to_string(),
                "retryAfter": retry_after_secs,
                "timestamp": timestamp,
            }),
            Self::ExecutionTimeout { error_id, .. } | Self::ExecutionFailure { error_id, .. } => {
                json!({
                    "error": "Internal server error",
                    "errorId": error_id,
                    "timestamp": timestamp,
                })
            }
            _ => json!({
                "error": self.to_string(),
                "timestamp": timestamp,
            }),
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();
        if let Self::RateLimited { retry_after_secs } = self
            && let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}

/// The parts of an HTTP request a guard needs.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: HashMap<String, String>,
    /// Why the raw query string could not be decoded, if it could not.
    pub query_error: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_id: String,
}

/// A validated descriptor wrapped with its guards and handler.
pub struct PluginGuard {
    descriptor: Arc<PluginDescriptor>,
    handler: Arc<dyn PluginHandler>,
    rules: Vec<CompiledRule>,
    auth: AuthConfig,
    limiter: Arc<RateLimiter>,
}

impl PluginGuard {
    /// Wrap a descriptor and its handler.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter pattern does not compile.
    pub fn new(
        descriptor: Arc<PluginDescriptor>,
        handler: Arc<dyn PluginHandler>,
        auth: AuthConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, HotrouteError> {
        let rules = compile_rules(&descriptor.parameters)?;
        Ok(Self {
            descriptor,
            handler,
            rules,
            auth,
            limiter,
        })
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn handler(&self) -> &Arc<dyn PluginHandler> {
        &self.handler
    }

    /// Run the pipeline and render the outcome as an HTTP response.
    pub async fn handle(&self, request: IncomingRequest) -> Response {
        match self.run(request).await {
            Ok(response) => into_http_response(response, &self.descriptor.file),
            Err(rejection) => rejection.into_response(),
        }
    }

    /// Run the pipeline, returning the handler's response or the first rejection.
    pub async fn run(&self, request: IncomingRequest) -> Result<PluginResponse, GuardRejection> {
        let plugin = &self.descriptor.name;

        if self.descriptor.authentication
            && let Err(rejection) = self.auth.authenticate(&request.headers)
        {
            debug!(plugin = %plugin, reason = %rejection, "authentication rejected");
            return Err(rejection);
        }

        let (body, params) = extract_params(&request)?;
        let details = validate_params(&self.rules, &params);
        if !details.is_empty() {
            debug!(plugin = %plugin, ?details, "parameter validation failed");
            return Err(GuardRejection::ValidationFailed { details });
        }

        if let Some(spec) = &self.descriptor.rate_limit
            && let RateLimitDecision::Limited { retry_after_secs } =
                self.limiter.check(&request.client_id, plugin, spec)
        {
            warn!(
                plugin = %plugin,
                client = %request.client_id,
                retry_after_secs,
                "rate limit exceeded"
            );
            return Err(GuardRejection::RateLimited { retry_after_secs });
        }

        let plugin_request = PluginRequest {
            method: request.method,
            path: request.path,
            query: request.query,
            headers: request
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect(),
            body,
            params,
            client_id: request.client_id,
        };

        self.execute(plugin_request).await
    }

    /// Execute the handler under the plugin's timeout.
    ///
    /// The handler runs in its own task and is never aborted: on timeout the
    /// guard stops waiting and a detached task logs whatever the handler
    /// eventually produces.
    async fn execute(&self, request: PluginRequest) -> Result<PluginResponse, GuardRejection> {
        let plugin = self.descriptor.name.clone();
        let timeout_ms = self.descriptor.timeout_ms;
        let handler = Arc::clone(&self.handler);
        let mut task = tokio::spawn(async move { handler.exec(request).await });

        let message = match tokio::time::timeout(Duration::from_millis(timeout_ms), &mut task).await
        {
            Ok(Ok(Ok(response))) => return Ok(response),
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(join_error)) => format!("handler panicked: {join_error}"),
            Err(_) => {
                let error_id = uuid::Uuid::new_v4().to_string();
                error!(
                    plugin = %plugin,
                    error_id = %error_id,
                    timeout_ms,
                    "plugin execution timed out"
                );
                tokio::spawn(async move {
                    match task.await {
                        Ok(Ok(_)) => {
                            debug!(plugin = %plugin, "timed-out execution finished late")
                        }
                        Ok(Err(e)) => warn!(
                            plugin = %plugin,
                            error = %e,
                            "timed-out execution failed after the response was sent"
                        ),
                        Err(e) => warn!(
                            plugin = %plugin,
                            error = %e,
                            "timed-out execution panicked after the response was sent"
                        ),
                    }
                });
                return Err(GuardRejection::ExecutionTimeout {
                    error_id,
                    timeout_ms,
                });
            }
        };

        let error_id = uuid::Uuid::new_v4().to_string();
        error!(
            plugin = %plugin,
            error_id = %error_id,
            error = %message,
            "plugin execution failed"
        );
        Err(GuardRejection::ExecutionFailure { error_id, message })
    }
}

/// Pick the parameter source: the query string for GET, the JSON body otherwise.
///
/// Returns the parsed body (`Null` when absent) alongside the parameters.
fn extract_params(request: &IncomingRequest) -> Result<(Value, Map<String, Value>), GuardRejection> {
    if request.method.reads_query() {
        if let Some(error) = &request.query_error {
            return Err(GuardRejection::ValidationFailed {
                details: vec![format!("query string is malformed: {error}")],
            });
        }
        let body = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let params = request
            .query
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        return Ok((body, params));
    }

    let body = if request.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&request.body).map_err(|_| body_not_object())?
    };

    match &body {
        Value::Null => Ok((body, Map::new())),
        Value::Object(map) => {
            let params = map.clone();
            Ok((body, params))
        }
        _ => Err(body_not_object()),
    }
}

fn body_not_object() -> GuardRejection {
    GuardRejection::ValidationFailed {
        details: vec!["body must be a JSON object".to_string()],
    }
}

/// Convert a handler's response into an axum response.
fn into_http_response(response: PluginResponse, file: &str) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or_else(|_| {
        warn!(file = %file, status = response.status, "handler returned an invalid status");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut http = match response.body {
        ResponseBody::Json(value) => Json(value).into_response(),
        ResponseBody::Text(text) => text.into_response(),
        ResponseBody::Empty => Body::empty().into_response(),
    };
    *http.status_mut() = status;

    for (name, value) in response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                http.headers_mut().insert(name, value);
            }
            _ => warn!(file = %file, header = %name, "handler returned an invalid header"),
        }
    }
    http
}

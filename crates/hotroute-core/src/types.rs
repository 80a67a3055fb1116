// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the registry, the guard pipeline, and handlers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// HTTP verbs a plugin may register a route for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// All supported verbs, in declaration order.
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    /// Whether request parameters come from the query string (GET) or the body.
    pub fn reads_query(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

/// Health status reported by plugin health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Plugin is fully operational.
    Healthy,
    /// Plugin is operational but experiencing issues.
    Degraded(String),
    /// Plugin is not operational.
    Unhealthy(String),
}

/// An inbound request as seen by a plugin handler.
///
/// Built by the guard pipeline after authentication and parameter validation
/// succeeded. `params` holds the parameter source the validator checked: the
/// query string for GET routes, the JSON body object otherwise.
#[derive(Debug, Clone)]
pub struct PluginRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Request path (without query string).
    pub path: String,
    /// Decoded query string pairs.
    pub query: HashMap<String, String>,
    /// Request headers, lowercased names.
    pub headers: HashMap<String, String>,
    /// Parsed JSON body (`Null` when the request carried none).
    pub body: serde_json::Value,
    /// Validated parameter source.
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Client identity used for rate limiting.
    pub client_id: String,
}

impl PluginRequest {
    /// Look up a parameter by name in the validated parameter source.
    pub fn param(&self, name: &str) -> Option<&serde_json::Value> {
        self.params.get(name)
    }

    /// Look up a parameter and return it as a string, if it is one.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(|v| v.as_str())
    }

    /// Look up a header by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Body of a plugin response. The wire format is entirely up to the plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
    Empty,
}

/// Response produced by a plugin handler.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginResponse {
    /// HTTP status code.
    pub status: u16,
    /// Additional response headers.
    pub headers: Vec<(String, String)>,
    /// Response payload.
    pub body: ResponseBody,
}

impl PluginResponse {
    /// A 200 response with a JSON body.
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: ResponseBody::Json(value),
        }
    }

    /// A 200 response with a plain-text body.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: ResponseBody::Text(text.into()),
        }
    }

    /// A 204 response with no body.
    pub fn empty() -> Self {
        Self {
            status: 204,
            headers: Vec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// Override the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Append a response header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

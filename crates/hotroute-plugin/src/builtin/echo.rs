// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Echo handler: reflects one request parameter back to the caller.
//!
//! With default options, `GET /ping?message=hi` answers
//! `{"success": true, "msg": "hi"}` and a missing `message` answers `"msg": ""`.

use std::sync::Arc;

use async_trait::async_trait;
use hotroute_core::{HandlerFactory, HotrouteError, PluginHandler, PluginRequest, PluginResponse};
use serde::Deserialize;

use super::parse_options;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct EchoOptions {
    /// Request parameter to reflect.
    param: String,
    /// Response key the parameter is written to.
    key: String,
}

impl Default for EchoOptions {
    fn default() -> Self {
        Self {
            param: "message".to_string(),
            key: "msg".to_string(),
        }
    }
}

/// Builds [`EchoHandler`]s.
pub struct EchoFactory;

impl HandlerFactory for EchoFactory {
    fn kind(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Reflect a request parameter back as JSON"
    }

    fn create(
        &self,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn PluginHandler>, HotrouteError> {
        let options: EchoOptions = parse_options(self.kind(), options)?;
        Ok(Arc::new(EchoHandler { options }))
    }
}

/// Reflects the configured parameter under the configured key.
pub struct EchoHandler {
    options: EchoOptions,
}

#[async_trait]
impl PluginHandler for EchoHandler {
    fn kind(&self) -> &str {
        "echo"
    }

    async fn exec(&self, request: PluginRequest) -> Result<PluginResponse, HotrouteError> {
        let value = request
            .param(&self.options.param)
            .cloned()
            .unwrap_or_else(|| serde_json::Value::String(String::new()));

        let mut body = serde_json::Map::new();
        body.insert("success".to_string(), serde_json::Value::Bool(true));
        body.insert(self.options.key.clone(), value);
        Ok(PluginResponse::json(serde_json::Value::Object(body)))
    }
}

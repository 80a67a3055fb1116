// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static handler: answers every request with the same response.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use hotroute_core::{HandlerFactory, HotrouteError, PluginHandler, PluginRequest, PluginResponse};
use serde::Deserialize;

use super::parse_options;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StaticOptions {
    status: u16,
    body: Option<serde_json::Value>,
    text: Option<String>,
    headers: BTreeMap<String, String>,
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self {
            status: 200,
            body: None,
            text: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Builds [`StaticHandler`]s.
pub struct StaticFactory;

impl HandlerFactory for StaticFactory {
    fn kind(&self) -> &str {
        "static"
    }

    fn description(&self) -> &str {
        "Return a fixed JSON or text response"
    }

    fn create(
        &self,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn PluginHandler>, HotrouteError> {
        let options: StaticOptions = parse_options(self.kind(), options)?;

        if !(100..=599).contains(&options.status) {
            return Err(HotrouteError::handler(format!(
                "status {} is not a valid HTTP status code",
                options.status
            )));
        }

        let mut response = match (options.body, options.text) {
            (Some(_), Some(_)) => {
                return Err(HotrouteError::handler(
                    "set either `body` or `text`, not both",
                ));
            }
            (Some(body), None) => PluginResponse::json(body),
            (None, Some(text)) => PluginResponse::text(text),
            (None, None) => PluginResponse::json(serde_json::json!({"success": true})),
        }
        .with_status(options.status);

        for (name, value) in options.headers {
            response = response.with_header(name, value);
        }

        Ok(Arc::new(StaticHandler { response }))
    }
}

/// Returns a clone of a prepared response.
pub struct StaticHandler {
    response: PluginResponse,
}

#[async_trait]
impl PluginHandler for StaticHandler {
    fn kind(&self) -> &str {
        "static"
    }

    async fn exec(&self, _request: PluginRequest) -> Result<PluginResponse, HotrouteError> {
        Ok(self.response.clone())
    }
}

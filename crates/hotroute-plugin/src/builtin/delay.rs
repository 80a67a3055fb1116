// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delay handler: sleeps before answering. Useful for exercising timeouts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hotroute_core::{HandlerFactory, HotrouteError, PluginHandler, PluginRequest, PluginResponse};
use serde::Deserialize;

use super::parse_options;

/// Sleep applied when the descriptor sets no `ms` option.
pub const DEFAULT_DELAY_MS: u64 = 1_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DelayOptions {
    ms: u64,
    body: Option<serde_json::Value>,
}

impl Default for DelayOptions {
    fn default() -> Self {
        Self {
            ms: DEFAULT_DELAY_MS,
            body: None,
        }
    }
}

/// Builds [`DelayHandler`]s.
pub struct DelayFactory;

impl HandlerFactory for DelayFactory {
    fn kind(&self) -> &str {
        "delay"
    }

    fn description(&self) -> &str {
        "Sleep for a fixed duration, then respond"
    }

    fn create(
        &self,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn PluginHandler>, HotrouteError> {
        let options: DelayOptions = parse_options(self.kind(), options)?;
        let body = options
            .body
            .unwrap_or_else(|| serde_json::json!({"success": true, "delayedMs": options.ms}));
        Ok(Arc::new(DelayHandler {
            delay: Duration::from_millis(options.ms),
            body,
        }))
    }
}

/// Sleeps for `delay`, then returns `body`.
pub struct DelayHandler {
    delay: Duration,
    body: serde_json::Value,
}

#[async_trait]
impl PluginHandler for DelayHandler {
    fn kind(&self) -> &str {
        "delay"
    }

    async fn exec(&self, _request: PluginRequest) -> Result<PluginResponse, HotrouteError> {
        tokio::time::sleep(self.delay).await;
        Ok(PluginResponse::json(self.body.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotroute_core::{HttpMethod, ResponseBody};
    use serde_json::json;

    fn request() -> PluginRequest {
        PluginRequest {
            method: HttpMethod::Get,
            path: "/slow".into(),
            query: Default::default(),
            headers: Default::default(),
            body: serde_json::Value::Null,
            params: Default::default(),
            client_id: "test".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_before_responding() {
        let handler = DelayFactory.create(&json!({"ms": 250})).unwrap();
        let started = tokio::time::Instant::now();
        let resp = handler.exec(request()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert_eq!(
            resp.body,
            ResponseBody::Json(json!({"success": true, "delayedMs": 250}))
        );
    }

    #[test]
    fn rejects_negative_delay() {
        assert!(DelayFactory.create(&json!({"ms": -1})).is_err());
    }
}

// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock handler for deterministic testing.
//!
//! Descriptors select it with `handler = "mock"` and script its behavior
//! through `[options]`:
//!
//! ```toml
//! [options]
//! delay_ms = 200          # sleep before answering
//! fail = "boom"           # return a handler error
//! panic = true            # panic inside the handler
//! unhealthy = "db down"   # health check reports unhealthy
//! health_error = "oops"   # health check itself fails
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hotroute_core::{
    HandlerFactory, HealthStatus, HotrouteError, PluginHandler, PluginRequest, PluginResponse,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MockOptions {
    delay_ms: u64,
    fail: Option<String>,
    panic: bool,
    unhealthy: Option<String>,
    health_error: Option<String>,
}

/// Shared counters across every handler a [`MockHandlerFactory`] created.
#[derive(Debug, Default)]
pub struct MockCounters {
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl MockCounters {
    /// Executions that began.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Executions that ran to the end of their delay, including scripted failures.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

/// Builds [`MockHandler`]s and records what they do.
#[derive(Clone, Default)]
pub struct MockHandlerFactory {
    counters: Arc<MockCounters>,
}

impl MockHandlerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> &Arc<MockCounters> {
        &self.counters
    }
}

impl HandlerFactory for MockHandlerFactory {
    fn kind(&self) -> &str {
        "mock"
    }

    fn description(&self) -> &str {
        "Scripted handler for tests"
    }

    fn create(
        &self,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn PluginHandler>, HotrouteError> {
        let options: MockOptions = if options.is_null() {
            MockOptions::default()
        } else {
            serde_json::from_value(options.clone()).map_err(|e| HotrouteError::Handler {
                message: format!("mock: invalid options: {e}"),
                source: Some(Box::new(e)),
            })?
        };
        Ok(Arc::new(MockHandler {
            options,
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Answers `{"mock": true, "params": ...}` unless scripted otherwise.
pub struct MockHandler {
    options: MockOptions,
    counters: Arc<MockCounters>,
}

#[async_trait]
impl PluginHandler for MockHandler {
    fn kind(&self) -> &str {
        "mock"
    }

    async fn exec(&self, request: PluginRequest) -> Result<PluginResponse, HotrouteError> {
        self.counters.started.fetch_add(1, Ordering::SeqCst);
        if self.options.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.options.delay_ms)).await;
        }
        self.counters.completed.fetch_add(1, Ordering::SeqCst);

        if self.options.panic {
            panic!("mock handler panicked on request");
        }
        if let Some(message) = &self.options.fail {
            return Err(HotrouteError::handler(message.clone()));
        }
        Ok(PluginResponse::json(json!({
            "mock": true,
            "params": request.params,
        })))
    }

    async fn health_check(&self) -> Result<HealthStatus, HotrouteError> {
        if let Some(message) = &self.options.health_error {
            return Err(HotrouteError::handler(message.clone()));
        }
        Ok(match &self.options.unhealthy {
            Some(message) => HealthStatus::Unhealthy(message.clone()),
            None => HealthStatus::Healthy,
        })
    }
}

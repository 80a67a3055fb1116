// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executable plugin capabilities and the factories that build them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HotrouteError;
use crate::types::{HealthStatus, PluginRequest, PluginResponse};

/// The executable half of a plugin: what runs once a request passed the guards.
///
/// Handlers are shared across concurrent requests and must not assume they
/// are cancelled when a request times out; the guard pipeline stops waiting
/// but lets the execution run to completion.
#[async_trait]
pub trait PluginHandler: Send + Sync + 'static {
    /// Catalog kind this handler was created from (e.g. "echo").
    fn kind(&self) -> &str;

    /// Handle one request.
    async fn exec(&self, request: PluginRequest) -> Result<PluginResponse, HotrouteError>;

    /// Report the handler's health. Handlers without a dedicated check are healthy.
    async fn health_check(&self) -> Result<HealthStatus, HotrouteError> {
        Ok(HealthStatus::Healthy)
    }
}

/// Builds handlers of one kind from a descriptor's `[options]` table.
pub trait HandlerFactory: Send + Sync {
    /// The `handler = "..."` value this factory answers to.
    fn kind(&self) -> &str;

    /// Human-readable description for catalog listings.
    fn description(&self) -> &str;

    /// Create a handler from descriptor options (`Null` when none were given).
    fn create(&self, options: &serde_json::Value)
    -> Result<Arc<dyn PluginHandler>, HotrouteError>;
}

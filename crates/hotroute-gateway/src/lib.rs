// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP host for hotroute plugins.
//!
//! Every request to a plugin route passes the guard pipeline (authentication,
//! parameter validation, rate limiting, bounded execution) before the
//! plugin's handler runs. The registry keeps the route table in step with the
//! plugin directory; [`reload`] applies watcher events to it.

pub mod auth;
pub mod guard;
pub mod handlers;
pub mod metadata;
pub mod params;
pub mod ratelimit;
pub mod registry;
pub mod reload;
pub mod router;
pub mod server;

pub use auth::AuthConfig;
pub use guard::{GuardRejection, IncomingRequest, PluginGuard};
pub use metadata::{EndpointFilter, EndpointMetadata, PluginHealth, RegistryStats, SortField};
pub use ratelimit::{client_identity, RateLimitDecision, RateLimiter};
pub use registry::{LoadSummary, Registry};
pub use reload::{apply_event, spawn_hot_reload};
pub use router::{RouteStackEntry, RouteTable};
pub use server::{build_router, start_server, GatewayState, HealthState, ServerConfig};

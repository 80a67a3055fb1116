// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the hotroute plugin router.
//!
//! This crate provides the error type, the request/response types plugin
//! handlers exchange with the guard pipeline, and the trait seams
//! (`PluginHandler`, `HandlerFactory`, `PluginSource`) the rest of the
//! workspace is built around.

pub mod error;
pub mod traits;
pub mod types;

pub use error::HotrouteError;
pub use types::{HealthStatus, HttpMethod, PluginRequest, PluginResponse, ResponseBody};

pub use traits::{HandlerFactory, PluginHandler, PluginSource};

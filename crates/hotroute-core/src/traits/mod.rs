// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the registry, plugin sources, and handler implementations.

pub mod handler;
pub mod source;

pub use handler::{HandlerFactory, PluginHandler};
pub use source::PluginSource;

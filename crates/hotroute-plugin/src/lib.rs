// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptors and everything needed to trust them.
//!
//! - [`descriptor`]: the TOML descriptor model and parser.
//! - [`validator`]: pure manifest validation that reports every violation.
//! - [`catalog`]: compiled-in handler factories descriptors can name.
//! - [`source`]: reads descriptors fresh from the plugin directory.
//! - [`watcher`]: debounced change notifications for the plugin directory.

pub mod builtin;
pub mod catalog;
pub mod descriptor;
pub mod source;
pub mod validator;
pub mod watcher;

pub use catalog::HandlerCatalog;
pub use descriptor::{
    is_reserved_path, parse_descriptor, ParamType, ParameterRule, ParameterSpec, PluginDescriptor,
    RateLimitSpec, DEFAULT_TIMEOUT_MS, DEFAULT_VERSION, HOST_HEALTH_PATH, HOST_ROUTE_PREFIX,
    PLUGIN_EXTENSION,
};
pub use source::DirectorySource;
pub use validator::{validate, ValidationReport};
pub use watcher::{PluginWatcher, WatchEvent, WatcherConfig};

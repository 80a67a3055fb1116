// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in handlers for hotroute plugins.
//!
//! These handlers are always available to descriptors through
//! `handler = "<kind>"` without any extra registration.

pub mod delay;
pub mod echo;
pub mod fixed;

pub use delay::DelayFactory;
pub use echo::EchoFactory;
pub use fixed::StaticFactory;

use std::sync::Arc;

use hotroute_core::HotrouteError;
use serde::de::DeserializeOwned;

use crate::catalog::HandlerCatalog;

/// Registers all built-in handler factories into the given catalog.
pub fn register_builtins(catalog: &mut HandlerCatalog) {
    catalog.register(Arc::new(EchoFactory));
    catalog.register(Arc::new(StaticFactory));
    catalog.register(Arc::new(DelayFactory));
}

/// Deserialize a handler's `[options]` table, using defaults when absent.
pub(crate) fn parse_options<T>(kind: &str, options: &serde_json::Value) -> Result<T, HotrouteError>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| HotrouteError::Handler {
        message: format!("invalid `{kind}` options: {e}"),
        source: Some(Box::new(e)),
    })
}

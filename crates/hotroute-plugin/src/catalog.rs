// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handler catalog: the compiled-in executable capabilities descriptors can name.
//!
//! A descriptor's `handler = "echo"` is resolved here to a
//! [`HandlerFactory`], which turns the descriptor's `[options]` table into a
//! ready [`PluginHandler`].

use std::collections::HashMap;
use std::sync::Arc;

use hotroute_core::{HandlerFactory, HotrouteError, PluginHandler};

use crate::builtin;

/// Registry of handler factories, indexed by kind.
pub struct HandlerCatalog {
    factories: HashMap<String, Arc<dyn HandlerFactory>>,
}

impl HandlerCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a catalog holding every built-in handler.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        builtin::register_builtins(&mut catalog);
        catalog
    }

    /// Registers a factory under its `kind()`, replacing any previous one.
    pub fn register(&mut self, factory: Arc<dyn HandlerFactory>) {
        self.factories.insert(factory.kind().to_string(), factory);
    }

    /// Looks up a factory by kind.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn HandlerFactory>> {
        self.factories.get(kind).cloned()
    }

    /// Whether a factory is registered for `kind`.
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Sorted list of registered kinds.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Returns (kind, description) pairs for all registered factories, sorted by kind.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .factories
            .values()
            .map(|f| (f.kind(), f.description()))
            .collect();
        entries.sort_by_key(|(kind, _)| *kind);
        entries
    }

    /// Build a handler of `kind` from descriptor options.
    pub fn create(
        &self,
        kind: &str,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn PluginHandler>, HotrouteError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| HotrouteError::handler(format!("unknown handler `{kind}`")))?;
        factory.create(options)
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for HandlerCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

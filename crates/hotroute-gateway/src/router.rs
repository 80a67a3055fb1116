// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The host route table.
//!
//! The route stack is immutable once published. Every mutation builds a new
//! stack and swaps it in, so request dispatch reads a consistent snapshot
//! without locking and never sees a half-applied reload.

use std::sync::Arc;

use arc_swap::ArcSwap;
use hotroute_core::{HotrouteError, HttpMethod};

use crate::guard::PluginGuard;

/// One mounted route.
pub struct RouteStackEntry {
    pub method: HttpMethod,
    pub path: String,
    /// File identity of the plugin that owns the route.
    pub file: String,
    pub guard: Arc<PluginGuard>,
}

impl RouteStackEntry {
    pub fn new(file: impl Into<String>, guard: Arc<PluginGuard>) -> Self {
        let descriptor = guard.descriptor();
        Self {
            method: descriptor.method,
            path: descriptor.path.clone(),
            file: file.into(),
            guard,
        }
    }

    fn matches(&self, method: HttpMethod, path: &str) -> bool {
        self.method == method && self.path == path
    }
}

impl std::fmt::Debug for RouteStackEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteStackEntry")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("file", &self.file)
            .finish()
    }
}

type RouteStack = Vec<Arc<RouteStackEntry>>;

/// Lock-free, atomically swapped route stack.
#[derive(Default)]
pub struct RouteTable {
    stack: ArcSwap<RouteStack>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current route stack, in mount order.
    pub fn routes(&self) -> Arc<RouteStack> {
        self.stack.load_full()
    }

    /// Find the guard mounted at `(method, path)`.
    pub fn resolve(&self, method: HttpMethod, path: &str) -> Option<Arc<PluginGuard>> {
        self.stack
            .load()
            .iter()
            .find(|entry| entry.matches(method, path))
            .map(|entry| Arc::clone(&entry.guard))
    }

    /// Mount a route.
    ///
    /// # Errors
    ///
    /// Returns [`HotrouteError::RouteConflict`] if `(method, path)` is already mounted.
    pub fn mount(&self, entry: RouteStackEntry) -> Result<(), HotrouteError> {
        self.replace(None, entry)
    }

    /// Remove the route at exactly `(method, path)`. Returns whether one was removed.
    pub fn unmount(&self, method: HttpMethod, path: &str) -> bool {
        let mut removed = false;
        self.stack.rcu(|current| {
            let next: RouteStack = current
                .iter()
                .filter(|entry| !entry.matches(method, path))
                .cloned()
                .collect();
            removed = next.len() != current.len();
            next
        });
        removed
    }

    /// Atomically unmount `previous` (if any) and mount `entry`.
    ///
    /// Readers observe either the old stack or the new one, never a stack
    /// with neither route. On conflict nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`HotrouteError::RouteConflict`] if `entry`'s `(method, path)`
    /// is mounted by a route other than `previous`.
    pub fn replace(
        &self,
        previous: Option<(HttpMethod, &str)>,
        entry: RouteStackEntry,
    ) -> Result<(), HotrouteError> {
        let entry = Arc::new(entry);
        let mut outcome = Ok(());

        self.stack.rcu(|current| {
            let mut next: RouteStack = current
                .iter()
                .filter(|existing| {
                    previous.is_none_or(|(method, path)| !existing.matches(method, path))
                })
                .cloned()
                .collect();

            if let Some(owner) = next
                .iter()
                .find(|existing| existing.matches(entry.method, &entry.path))
            {
                outcome = Err(HotrouteError::RouteConflict {
                    method: entry.method.to_string(),
                    path: entry.path.clone(),
                    owner: owner.file.clone(),
                });
                return Arc::clone(current);
            }

            outcome = Ok(());
            next.push(Arc::clone(&entry));
            Arc::new(next)
        });

        outcome
    }

    /// Number of mounted routes.
    pub fn len(&self) -> usize {
        self.stack.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.load().is_empty()
    }
}

// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source reader capability for plugin descriptors.

use async_trait::async_trait;

use crate::error::HotrouteError;

/// Yields the current definition of plugin descriptors, keyed by file identity.
///
/// Implementations must not memoize: every `read` returns what is stored
/// right now, so a reload never trusts a previously parsed descriptor.
#[async_trait]
pub trait PluginSource: Send + Sync {
    /// Human-readable location of the source (e.g. a directory path).
    fn location(&self) -> String;

    /// List the file identities of all plugin descriptors, sorted.
    async fn list(&self) -> Result<Vec<String>, HotrouteError>;

    /// Read the raw descriptor text for one file identity.
    async fn read(&self, file: &str) -> Result<String, HotrouteError>;

    /// Whether a descriptor currently exists for this file identity.
    async fn exists(&self, file: &str) -> bool;
}

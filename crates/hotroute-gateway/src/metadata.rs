// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Introspection views of the registry: endpoint metadata, filters, and stats.

use std::collections::{BTreeMap, BTreeSet};

use hotroute_core::HttpMethod;
use hotroute_plugin::{ParameterSpec, PluginDescriptor, RateLimitSpec};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Docs-facing description of one registered plugin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMetadata {
    pub file: String,
    pub name: String,
    pub path: String,
    pub method: HttpMethod,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub authentication: bool,
    pub parameters: Vec<ParameterSpec>,
    pub rate_limit: Option<RateLimitSpec>,
    pub timeout_ms: u64,
    pub version: String,
    pub deprecated: bool,
    /// RFC 3339 time the plugin was (re)registered.
    pub registered_at: String,
}

impl EndpointMetadata {
    pub fn from_descriptor(descriptor: &PluginDescriptor) -> Self {
        Self {
            file: descriptor.file.clone(),
            name: descriptor.name.clone(),
            path: descriptor.path.clone(),
            method: descriptor.method,
            description: descriptor.description.clone(),
            tags: descriptor.tags.clone(),
            authentication: descriptor.authentication,
            parameters: descriptor.parameters.clone(),
            rate_limit: descriptor.rate_limit,
            timeout_ms: descriptor.timeout_ms,
            version: descriptor.version.clone(),
            deprecated: descriptor.deprecated,
            registered_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Field endpoint listings are sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    #[default]
    Path,
    Method,
    Version,
    File,
}

/// Filters for [`crate::Registry::list_endpoints`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointFilter {
    pub method: Option<HttpMethod>,
    pub authentication: Option<bool>,
    pub tag: Option<String>,
    pub deprecated: Option<bool>,
    pub sort: SortField,
}

impl EndpointFilter {
    pub fn matches(&self, endpoint: &EndpointMetadata) -> bool {
        self.method.is_none_or(|m| endpoint.method == m)
            && self
                .authentication
                .is_none_or(|a| endpoint.authentication == a)
            && self
                .tag
                .as_ref()
                .is_none_or(|t| endpoint.tags.contains(t))
            && self.deprecated.is_none_or(|d| endpoint.deprecated == d)
    }

    /// Filter and sort a set of endpoints. Ties break on file identity.
    pub fn apply(&self, endpoints: impl IntoIterator<Item = EndpointMetadata>) -> Vec<EndpointMetadata> {
        let mut selected: Vec<EndpointMetadata> =
            endpoints.into_iter().filter(|e| self.matches(e)).collect();

        selected.sort_by(|a, b| {
            let primary = match self.sort {
                SortField::Name => a.name.cmp(&b.name),
                SortField::Path => a.path.cmp(&b.path),
                SortField::Method => a.method.cmp(&b.method),
                SortField::Version => compare_versions(&a.version, &b.version),
                SortField::File => a.file.cmp(&b.file),
            };
            primary.then_with(|| a.file.cmp(&b.file))
        });
        selected
    }
}

fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Aggregate counts over the registered plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_plugins: usize,
    pub total_endpoints: usize,
    pub method_distribution: BTreeMap<HttpMethod, usize>,
    pub auth_required_count: usize,
    pub deprecated_count: usize,
}

impl RegistryStats {
    pub fn from_endpoints<'a>(
        endpoints: impl IntoIterator<Item = &'a EndpointMetadata>,
        total_endpoints: usize,
    ) -> Self {
        let mut stats = Self {
            total_endpoints,
            ..Self::default()
        };
        for endpoint in endpoints {
            stats.total_plugins += 1;
            *stats.method_distribution.entry(endpoint.method).or_default() += 1;
            if endpoint.authentication {
                stats.auth_required_count += 1;
            }
            if endpoint.deprecated {
                stats.deprecated_count += 1;
            }
        }
        stats
    }
}

/// Outcome of one plugin health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginHealth {
    /// `"ok"`, `"degraded"`, or `"error"`.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PluginHealth {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

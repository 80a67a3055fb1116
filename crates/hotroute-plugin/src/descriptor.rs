// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptor model and TOML parsing.
//!
//! A plugin is one `*.toml` file in the plugin directory. The file name is
//! the plugin's identity; the descriptor names a route, its guards, and the
//! catalog handler that executes it.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use hotroute_core::{HotrouteError, HttpMethod};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::catalog::HandlerCatalog;
use crate::validator;

/// Extension every plugin descriptor file carries.
pub const PLUGIN_EXTENSION: &str = "toml";

/// Execution timeout applied when a descriptor sets none.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Version reported for descriptors that set none.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Path of the host's own health endpoint.
pub const HOST_HEALTH_PATH: &str = "/health";

/// Prefix of the host's introspection endpoints.
pub const HOST_ROUTE_PREFIX: &str = "/_hotroute";

/// Whether `path` is served by the host itself and cannot be claimed by a plugin.
pub fn is_reserved_path(path: &str) -> bool {
    path == HOST_HEALTH_PATH
        || path
            .strip_prefix(HOST_ROUTE_PREFIX)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Value types a parameter can be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Email,
    Url,
}

/// A parameter declaration: either a bare required name or a full rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterSpec {
    Name(String),
    Rule(ParameterRule),
}

/// Constraints for a single request parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterRule {
    pub name: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ParamType>,
    /// Minimum length of the value's string form, in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    /// Maximum length of the value's string form, in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

fn default_required() -> bool {
    true
}

impl ParameterSpec {
    /// The parameter's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Rule(rule) => &rule.name,
        }
    }

    /// Normalize to a full rule. A bare name is a required, untyped parameter.
    pub fn to_rule(&self) -> ParameterRule {
        match self {
            Self::Name(name) => ParameterRule {
                name: name.clone(),
                required: true,
                kind: None,
                min: None,
                max: None,
                pattern: None,
            },
            Self::Rule(rule) => rule.clone(),
        }
    }
}

/// Sliding-window rate limit for one plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSpec {
    /// Maximum requests per client inside the window.
    pub limit: u32,
    /// Window length in milliseconds.
    #[serde(rename(serialize = "windowMs"))]
    pub window_ms: u64,
}

/// A validated plugin descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    /// File identity (file name inside the plugin directory).
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
    /// Catalog kind of the handler that executes requests.
    pub handler: String,
    /// Handler options as JSON (`Null` when the descriptor has no `[options]`).
    pub options: serde_json::Value,
    pub version: String,
    pub deprecated: bool,
}

/// On-disk shape of a descriptor before defaults and normalization.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    path: String,
    method: Option<String>,
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    authentication: bool,
    #[serde(default)]
    parameter: Vec<ParameterSpec>,
    rate_limit: Option<RateLimitSpec>,
    timeout_ms: Option<u64>,
    handler: String,
    options: Option<toml::Table>,
    version: Option<String>,
    #[serde(default)]
    deprecated: bool,
}

impl PluginDescriptor {
    /// Convert a raw TOML value into a typed descriptor, applying defaults.
    ///
    /// Does not run manifest validation; use [`parse_descriptor`] for that.
    pub fn from_value(file: &str, raw: &toml::Value) -> Result<Self, String> {
        let parsed: DescriptorFile = raw.clone().try_into().map_err(|e| e.to_string())?;

        let method = match parsed.method.as_deref() {
            Some(m) => HttpMethod::from_str(m).map_err(|_| format!("method `{m}` is not supported"))?,
            None => HttpMethod::Get,
        };

        let options = match parsed.options {
            Some(table) => serde_json::to_value(&table).map_err(|e| format!("options: {e}"))?,
            None => serde_json::Value::Null,
        };

        Ok(Self {
            file: file.to_string(),
            name: parsed.name.unwrap_or_else(|| file_stem(file)),
            path: parsed.path,
            method,
            description: parsed.description,
            tags: parsed.tags.into_iter().collect(),
            authentication: parsed.authentication,
            parameters: parsed.parameter,
            rate_limit: parsed.rate_limit,
            timeout_ms: parsed.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            handler: parsed.handler,
            options,
            version: parsed.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            deprecated: parsed.deprecated,
        })
    }
}

/// Parse and validate descriptor text read from `file`.
///
/// Every manifest violation is reported at once in
/// [`HotrouteError::ManifestInvalid`].
pub fn parse_descriptor(
    file: &str,
    text: &str,
    catalog: &HandlerCatalog,
) -> Result<PluginDescriptor, HotrouteError> {
    let invalid = |errors: Vec<String>| HotrouteError::ManifestInvalid {
        file: file.to_string(),
        errors,
    };

    let raw = match text.parse::<toml::Table>() {
        Ok(table) => toml::Value::Table(table),
        Err(e) => {
            return Err(invalid(vec![format!(
                "descriptor is not a structured object: {}",
                e.message()
            )]));
        }
    };

    let report = validator::validate(&raw, file, catalog);
    if !report.is_valid() {
        return Err(invalid(report.errors));
    }

    PluginDescriptor::from_value(file, &raw).map_err(|e| invalid(vec![e]))
}

/// Whether `path` names a plugin descriptor file (by extension, not hidden).
pub fn is_descriptor_path(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_none_or(|n| n.starts_with('.'));
    !hidden && path.extension().and_then(|e| e.to_str()) == Some(PLUGIN_EXTENSION)
}

fn file_stem(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file)
        .to_string()
}

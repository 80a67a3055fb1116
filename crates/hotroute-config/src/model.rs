// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level hotroute configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HotrouteConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Plugin discovery and hot reload settings.
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// Bearer token authentication for plugins with `authentication = true`.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Rate limiter settings shared by all plugins.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_body_limit() -> usize {
    1024 * 1024
}

/// Plugin directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Directory scanned (non-recursively) for `*.toml` plugin descriptors.
    #[serde(default = "default_plugin_dir")]
    pub directory: String,

    /// Watch the plugin directory and reload changed descriptors.
    #[serde(default = "default_hot_reload")]
    pub hot_reload: bool,

    /// Quiescence window before a changed descriptor is reloaded.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_dir(),
            hot_reload: default_hot_reload(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_plugin_dir() -> String {
    "plugins".to_string()
}

fn default_hot_reload() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    300
}

/// Authentication configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared bearer token. `None` means authenticated plugins reject every request.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Use the first `X-Forwarded-For` entry as the client identity.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = HotrouteConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.body_limit_bytes, 1_048_576);
        assert_eq!(config.plugins.directory, "plugins");
        assert!(config.plugins.hot_reload);
        assert_eq!(config.plugins.debounce_ms, 300);
        assert!(config.auth.bearer_token.is_none());
        assert!(!config.rate_limit.trust_proxy_headers);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn auth_debug_redacts_token() {
        let auth = AuthConfig {
            bearer_token: Some("s3cret".to_string()),
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: HotrouteConfig = toml::from_str("[plugins]\nhot_reload = false\n").unwrap();
        assert!(!config.plugins.hot_reload);
        assert_eq!(config.plugins.directory, "plugins");
        assert_eq!(config.plugins.debounce_ms, 300);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = toml::from_str::<HotrouteConfig>("[server]\nprot = 8080\n");
        assert!(result.is_err());
    }
}

// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::HotrouteConfig;

/// Accepted values for `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `plugins.debounce_ms`.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &HotrouteConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.server.host.trim().is_empty() {
        fail("server.host must not be empty".to_string());
    }

    if config.server.port == 0 {
        fail("server.port must be between 1 and 65535".to_string());
    }

    if config.server.body_limit_bytes == 0 {
        fail("server.body_limit_bytes must be greater than zero".to_string());
    }

    if config.plugins.directory.trim().is_empty() {
        fail("plugins.directory must not be empty".to_string());
    }

    if config.plugins.debounce_ms > MAX_DEBOUNCE_MS {
        fail(format!(
            "plugins.debounce_ms must be at most {MAX_DEBOUNCE_MS}, got {}",
            config.plugins.debounce_ms
        ));
    }

    if let Some(token) = &config.auth.bearer_token
        && token.trim().is_empty()
    {
        fail("auth.bearer_token must not be blank when set".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.level `{}` is not one of: {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &HotrouteConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&HotrouteConfig::default()).is_ok());
    }

    #[test]
    fn zero_port_fails() {
        let mut config = HotrouteConfig::default();
        config.server.port = 0;
        assert!(messages(&config).iter().any(|m| m.contains("server.port")));
    }

    #[test]
    fn blank_token_fails() {
        let mut config = HotrouteConfig::default();
        config.auth.bearer_token = Some("   ".to_string());
        assert!(messages(&config).iter().any(|m| m.contains("bearer_token")));
    }

    #[test]
    fn unknown_log_level_fails() {
        let mut config = HotrouteConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("verbose")));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = HotrouteConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = HotrouteConfig::default();
        config.server.host = String::new();
        config.plugins.directory = " ".to_string();
        config.plugins.debounce_ms = 120_000;
        config.server.body_limit_bytes = 0;
        let errors = messages(&config);
        assert_eq!(errors.len(), 4, "{errors:?}");
    }
}

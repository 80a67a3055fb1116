// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest validation for plugin descriptors.
//!
//! Validation is pure and accumulates every violation so a broken plugin
//! file is reported in one log line rather than one fix at a time.

use std::str::FromStr;

use hotroute_core::HttpMethod;
use regex::Regex;

use crate::catalog::HandlerCatalog;
use crate::descriptor::{is_reserved_path, ParamType, PluginDescriptor};

/// Outcome of validating one descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every violation found, in check order.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// True when no violation was found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a raw descriptor loaded from `file`.
///
/// Structural checks (table shape, `path`, `handler`, `method`, parameter
/// declarations) run first. Semantic checks on the typed descriptor only run
/// when the structure is sound.
pub fn validate(raw: &toml::Value, file: &str, catalog: &HandlerCatalog) -> ValidationReport {
    let mut errors = Vec::new();

    let Some(table) = raw.as_table() else {
        errors.push("descriptor is not a structured object".to_string());
        return ValidationReport { errors };
    };

    match table.get("path") {
        None => errors.push("path is required".to_string()),
        Some(toml::Value::String(path)) if path.is_empty() => {
            errors.push("path must not be empty".to_string())
        }
        Some(toml::Value::String(path)) if !path.starts_with('/') => {
            errors.push(format!("path `{path}` must start with '/'"))
        }
        Some(toml::Value::String(path)) if is_reserved_path(path) => {
            errors.push(format!("path `{path}` is reserved by the host"))
        }
        Some(toml::Value::String(_)) => {}
        Some(_) => errors.push("path must be a string".to_string()),
    }

    match table.get("handler") {
        None => errors.push("handler is required".to_string()),
        Some(toml::Value::String(kind)) if !catalog.contains(kind) => errors.push(format!(
            "handler `{kind}` is not a known handler (available: {})",
            catalog.kinds().join(", ")
        )),
        Some(toml::Value::String(_)) => {}
        Some(_) => errors.push("handler must be a string".to_string()),
    }

    match table.get("method") {
        None => {}
        Some(toml::Value::String(method)) if HttpMethod::from_str(method).is_err() => {
            errors.push(format!(
                "method `{method}` is not supported (expected one of GET, POST, PUT, DELETE, PATCH)"
            ))
        }
        Some(toml::Value::String(_)) => {}
        Some(_) => errors.push("method must be a string".to_string()),
    }

    check_parameter_shapes(table.get("parameter"), &mut errors);

    if !errors.is_empty() {
        return ValidationReport { errors };
    }

    match PluginDescriptor::from_value(file, raw) {
        Ok(descriptor) => check_descriptor(&descriptor, catalog, &mut errors),
        Err(e) => errors.push(e),
    }

    ValidationReport { errors }
}

fn check_parameter_shapes(parameter: Option<&toml::Value>, errors: &mut Vec<String>) {
    let Some(parameter) = parameter else {
        return;
    };
    let Some(items) = parameter.as_array() else {
        errors.push("parameter must be an array".to_string());
        return;
    };

    for (index, item) in items.iter().enumerate() {
        match item {
            toml::Value::String(name) if name.trim().is_empty() => {
                errors.push(format!("parameter[{index}] name must not be empty"))
            }
            toml::Value::String(_) => {}
            toml::Value::Table(rule) => {
                match rule.get("name") {
                    Some(toml::Value::String(name)) if !name.trim().is_empty() => {}
                    _ => errors.push(format!("parameter[{index}] needs a non-empty `name`")),
                }
                if let Some(kind) = rule.get("type") {
                    let known = kind
                        .as_str()
                        .is_some_and(|k| ParamType::from_str(k).is_ok());
                    if !known {
                        errors.push(format!(
                            "parameter[{index}] type {kind} is not one of string, number, boolean, email, url"
                        ));
                    }
                }
            }
            _ => errors.push(format!(
                "parameter[{index}] must be a name or a table with a `name`"
            )),
        }
    }
}

fn check_descriptor(descriptor: &PluginDescriptor, catalog: &HandlerCatalog, errors: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    for spec in &descriptor.parameters {
        let rule = spec.to_rule();
        if !seen.insert(rule.name.clone()) {
            errors.push(format!("parameter `{}` is declared twice", rule.name));
        }
        if let Some(pattern) = &rule.pattern
            && let Err(e) = Regex::new(pattern)
        {
            errors.push(format!("parameter `{}` pattern is invalid: {e}", rule.name));
        }
        if let (Some(min), Some(max)) = (rule.min, rule.max)
            && min > max
        {
            errors.push(format!(
                "parameter `{}` min ({min}) exceeds max ({max})",
                rule.name
            ));
        }
    }

    if let Some(limit) = descriptor.rate_limit {
        if limit.limit == 0 {
            errors.push("rate_limit.limit must be positive".to_string());
        }
        if limit.window_ms == 0 {
            errors.push("rate_limit.window_ms must be positive".to_string());
        }
    }

    if descriptor.timeout_ms == 0 {
        errors.push("timeout_ms must be positive".to_string());
    }

    if let Err(e) = semver::Version::parse(&descriptor.version) {
        errors.push(format!(
            "version `{}` is not valid semver: {e}",
            descriptor.version
        ));
    }

    if let Err(e) = catalog.create(&descriptor.handler, &descriptor.options) {
        errors.push(format!(
            "handler `{}` rejected its options: {e}",
            descriptor.handler
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str) -> ValidationReport {
        let raw = toml::Value::Table(text.parse::<toml::Table>().unwrap());
        validate(&raw, "test.toml", &HandlerCatalog::builtin())
    }

    #[test]
    fn valid_descriptor_passes() {
        let report = check("path = \"/ping\"\nhandler = \"echo\"\nmethod = \"get\"\n");
        assert!(report.is_valid(), "{report:?}");
    }

    #[test]
    fn non_table_is_rejected() {
        let report = validate(
            &toml::Value::String("nope".into()),
            "x.toml",
            &HandlerCatalog::builtin(),
        );
        assert_eq!(report.errors, vec!["descriptor is not a structured object"]);
    }

    #[test]
    fn accumulates_structural_errors_in_order() {
        let report = check("method = \"OPTIONS\"\n");
        assert_eq!(report.errors.len(), 3, "{report:?}");
        assert!(report.errors[0].contains("path"));
        assert!(report.errors[1].contains("handler"));
        assert!(report.errors[2].contains("OPTIONS"));
    }

    #[test]
    fn path_must_start_with_slash() {
        let report = check("path = \"ping\"\nhandler = \"echo\"\n");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("must start with '/'"));

        let report = check("path = \"\"\nhandler = \"echo\"\n");
        assert!(report.errors[0].contains("must not be empty"));

        let report = check("path = 5\nhandler = \"echo\"\n");
        assert!(report.errors[0].contains("must be a string"));
    }

    #[test]
    fn host_paths_are_reserved() {
        for path in ["/health", "/_hotroute/stats", "/_hotroute/endpoints", "/_hotroute/x/y"] {
            let report = check(&format!("path = \"{path}\"\nmethod = \"POST\"\nhandler = \"echo\"\n"));
            assert_eq!(report.errors.len(), 1, "{path}: {report:?}");
            assert!(report.errors[0].contains("reserved by the host"));
        }
        assert!(check("path = \"/healthz\"\nhandler = \"echo\"\n").is_valid());
    }

    #[test]
    fn unknown_handler_lists_available_kinds() {
        let report = check("path = \"/x\"\nhandler = \"python\"\n");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("python"));
        assert!(report.errors[0].contains("echo"));
    }

    #[test]
    fn method_is_case_insensitive() {
        for method in ["get", "Post", "PUT", "delete", "pAtCh"] {
            let report = check(&format!(
                "path = \"/x\"\nhandler = \"echo\"\nmethod = \"{method}\"\n"
            ));
            assert!(report.is_valid(), "{method}: {report:?}");
        }
    }

    #[test]
    fn parameter_shapes_are_checked() {
        let report = check(
            r#"
path = "/x"
handler = "echo"
parameter = ["", { required = true }, { name = "n", type = "integer" }, 7]
"#,
        );
        assert_eq!(report.errors.len(), 4, "{report:?}");
        assert!(report.errors[2].contains("integer"));
    }

    #[test]
    fn semantic_errors_accumulate() {
        let report = check(
            r#"
path = "/x"
handler = "echo"
timeout_ms = 0
version = "one"
parameter = [
  { name = "a", pattern = "([" },
  { name = "b", min = 5, max = 2 },
  "a",
]
rate_limit = { limit = 0, window_ms = 0 }
"#,
        );
        let joined = report.errors.join("\n");
        assert!(joined.contains("pattern is invalid"), "{joined}");
        assert!(joined.contains("min (5) exceeds max (2)"), "{joined}");
        assert!(joined.contains("declared twice"), "{joined}");
        assert!(joined.contains("rate_limit.limit"), "{joined}");
        assert!(joined.contains("rate_limit.window_ms"), "{joined}");
        assert!(joined.contains("timeout_ms"), "{joined}");
        assert!(joined.contains("semver"), "{joined}");
        assert_eq!(report.errors.len(), 7);
    }

    #[test]
    fn handler_options_are_checked() {
        let report = check(
            "path = \"/x\"\nhandler = \"static\"\n[options]\nstatus = 99\n",
        );
        assert_eq!(report.errors.len(), 1, "{report:?}");
        assert!(report.errors[0].contains("rejected its options"));
    }
}

// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request parameter validation.
//!
//! Rules are compiled once per plugin load. Each rule is checked on its own
//! and every violation is reported.

use std::sync::LazyLock;

use hotroute_core::HotrouteError;
use hotroute_plugin::{ParamType, ParameterSpec};
use regex::Regex;
use serde_json::{Map, Value};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+[^\s]*$").unwrap());

/// A parameter rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub required: bool,
    pub kind: Option<ParamType>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub pattern: Option<Regex>,
}

impl CompiledRule {
    /// Compile a declared parameter.
    pub fn compile(spec: &ParameterSpec) -> Result<Self, HotrouteError> {
        let rule = spec.to_rule();
        let pattern = rule
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| {
                HotrouteError::Config(format!("parameter `{}` pattern is invalid: {e}", rule.name))
            })?;
        Ok(Self {
            name: rule.name,
            required: rule.required,
            kind: rule.kind,
            min: rule.min,
            max: rule.max,
            pattern,
        })
    }

    /// Check one parameter source, appending every violation to `errors`.
    fn check(&self, source: &Map<String, Value>, errors: &mut Vec<String>) {
        let name = &self.name;
        let Some(value) = source.get(name).filter(|v| !is_absent(v)) else {
            if self.required {
                errors.push(format!("{name} is required"));
            }
            return;
        };

        if let Some(kind) = self.kind
            && !matches_type(kind, value)
        {
            errors.push(match kind {
                ParamType::String => format!("{name} must be a string"),
                ParamType::Number => format!("{name} must be a number"),
                ParamType::Boolean => format!("{name} must be a boolean"),
                ParamType::Email => format!("{name} must be a valid email address"),
                ParamType::Url => format!("{name} must be a valid URL"),
            });
        }

        let text = string_form(value);
        let length = text.chars().count();
        if let Some(min) = self.min
            && length < min
        {
            errors.push(format!("{name} must be at least {min} characters"));
        }
        if let Some(max) = self.max
            && length > max
        {
            errors.push(format!("{name} must be at most {max} characters"));
        }
        if let Some(pattern) = &self.pattern
            && !pattern.is_match(&text)
        {
            errors.push(format!("{name} does not match pattern {}", pattern.as_str()));
        }
    }
}

/// Compile every declared parameter of a plugin.
pub fn compile_rules(specs: &[ParameterSpec]) -> Result<Vec<CompiledRule>, HotrouteError> {
    specs.iter().map(CompiledRule::compile).collect()
}

/// Validate a parameter source against all rules. Empty means valid.
pub fn validate_params(rules: &[CompiledRule], source: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();
    for rule in rules {
        rule.check(source, &mut errors);
    }
    errors
}

/// Missing, `null`, and empty-string values all count as absent.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn matches_type(kind: ParamType, value: &Value) -> bool {
    match kind {
        ParamType::String => value.is_string(),
        ParamType::Number => match value {
            Value::Number(_) => true,
            Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
            _ => false,
        },
        ParamType::Boolean => match value {
            Value::Bool(_) => true,
            Value::String(s) => s == "true" || s == "false",
            _ => false,
        },
        ParamType::Email => value.as_str().is_some_and(|s| EMAIL_RE.is_match(s)),
        ParamType::Url => value.as_str().is_some_and(|s| URL_RE.is_match(s)),
    }
}

/// The text a length or pattern check sees: strings as-is, anything else as JSON.
fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

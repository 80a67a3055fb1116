// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hotroute check` and `hotroute endpoints` command implementations.
//!
//! Both read the plugin directory exactly as `serve` would, without binding
//! a socket.

use std::collections::HashMap;
use std::fmt::Write as _;

use hotroute_config::HotrouteConfig;
use hotroute_core::{HotrouteError, HttpMethod, PluginSource};
use hotroute_gateway::{EndpointFilter, EndpointMetadata};
use hotroute_plugin::{parse_descriptor, DirectorySource, HandlerCatalog};

use crate::serve::{build_registry, init_tracing};

/// Outcome of checking one descriptor file.
#[derive(Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Valid { method: HttpMethod, path: String },
    Invalid { errors: Vec<String> },
}

/// Validate every descriptor in `source`, in listing order.
///
/// Valid descriptors that claim a route already claimed by an earlier file
/// are reported as invalid, matching what `serve` would register.
pub async fn check_source(
    source: &dyn PluginSource,
    catalog: &HandlerCatalog,
) -> Result<Vec<(String, CheckOutcome)>, HotrouteError> {
    let mut claimed: HashMap<(HttpMethod, String), String> = HashMap::new();
    let mut report = Vec::new();

    for file in source.list().await? {
        let outcome = match source.read(&file).await {
            Err(e) => CheckOutcome::Invalid {
                errors: vec![e.to_string()],
            },
            Ok(text) => match parse_descriptor(&file, &text, catalog) {
                Err(HotrouteError::ManifestInvalid { errors, .. }) => {
                    CheckOutcome::Invalid { errors }
                }
                Err(e) => CheckOutcome::Invalid {
                    errors: vec![e.to_string()],
                },
                Ok(descriptor) => {
                    let key = (descriptor.method, descriptor.path.clone());
                    match claimed.get(&key) {
                        Some(owner) => CheckOutcome::Invalid {
                            errors: vec![format!(
                                "route {} {} is already mounted by `{owner}`",
                                descriptor.method, descriptor.path
                            )],
                        },
                        None => {
                            claimed.insert(key, file.clone());
                            CheckOutcome::Valid {
                                method: descriptor.method,
                                path: descriptor.path,
                            }
                        }
                    }
                }
            },
        };
        report.push((file, outcome));
    }
    Ok(report)
}

/// Render a check report, one line per file plus one per error.
pub fn render_report(report: &[(String, CheckOutcome)]) -> String {
    let mut out = String::new();
    for (file, outcome) in report {
        match outcome {
            CheckOutcome::Valid { method, path } => {
                let _ = writeln!(out, "ok     {file}  {method} {path}");
            }
            CheckOutcome::Invalid { errors } => {
                let _ = writeln!(out, "error  {file}");
                for error in errors {
                    let _ = writeln!(out, "         - {error}");
                }
            }
        }
    }
    out
}

/// Runs `hotroute check`. Returns the number of invalid descriptors.
pub async fn run_check(config: &HotrouteConfig) -> Result<usize, HotrouteError> {
    let source = DirectorySource::new(&config.plugins.directory);
    let catalog = HandlerCatalog::builtin();
    let report = check_source(&source, &catalog).await?;

    print!("{}", render_report(&report));
    let failed = report
        .iter()
        .filter(|(_, o)| matches!(o, CheckOutcome::Invalid { .. }))
        .count();
    println!(
        "{} descriptor(s) checked, {failed} invalid",
        report.len()
    );
    Ok(failed)
}

/// Render endpoints as an aligned table.
pub fn render_table(endpoints: &[EndpointMetadata]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<7} {:<24} {:<20} {:<5} FILE", "METHOD", "PATH", "NAME", "AUTH");
    for e in endpoints {
        let auth = if e.authentication { "yes" } else { "no" };
        let deprecated = if e.deprecated { " (deprecated)" } else { "" };
        let _ = writeln!(
            out,
            "{:<7} {:<24} {:<20} {:<5} {}{deprecated}",
            e.method.to_string(),
            e.path,
            e.name,
            auth,
            e.file
        );
    }
    out
}

/// Runs `hotroute endpoints`.
pub async fn run_endpoints(config: &HotrouteConfig, json: bool) -> Result<(), HotrouteError> {
    init_tracing("warn");

    let registry = build_registry(config);
    registry.load_all().await?;
    let endpoints = registry.list_endpoints(&EndpointFilter::default()).await;

    if json {
        let text = serde_json::to_string_pretty(&endpoints)
            .map_err(|e| HotrouteError::Internal(format!("failed to encode endpoints: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", render_table(&endpoints));
    }
    Ok(())
}

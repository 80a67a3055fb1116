// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the hotroute plugin router.
//!
//! TOML files in the XDG hierarchy are merged with `HOTROUTE_*` environment
//! overrides via Figment, rejected on unknown keys, validated semantically,
//! and reported as miette diagnostics with typo suggestions.
//!
//! ```no_run
//! let config = hotroute_config::load_and_validate().expect("config errors");
//! println!("plugins from {}", config.plugins.directory);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::HotrouteConfig;

/// Load configuration from the standard hierarchy and validate it.
pub fn load_and_validate() -> Result<HotrouteConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<HotrouteConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<HotrouteConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

#[allow(clippy::result_large_err)]
fn finish(
    loaded: Result<HotrouteConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<HotrouteConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read every existing config file so diagnostics can point into it.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_file_candidates()
        .iter()
        .filter_map(|path| read_source(path))
        .collect()
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    // figment reports file sources by their canonical path.
    let display = std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string();
    Some((display, content))
}

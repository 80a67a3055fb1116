// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./hotroute.toml` > `~/.config/hotroute/hotroute.toml` >
//! `/etc/hotroute/hotroute.toml`, with `HOTROUTE_*` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HotrouteConfig;

/// Local config file name, also used under the XDG and system directories.
pub const CONFIG_FILE_NAME: &str = "hotroute.toml";

/// Top-level sections recognised in `HOTROUTE_<SECTION>_<KEY>` variables.
///
/// Longer names come first so `rate_limit_` is matched before any shorter
/// section that shares a prefix.
const ENV_SECTIONS: &[&str] = &["rate_limit", "server", "plugins", "logging", "auth"];

/// Candidate config files, lowest precedence first.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from("/etc/hotroute").join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("hotroute").join(CONFIG_FILE_NAME));
    }
    candidates.push(PathBuf::from(CONFIG_FILE_NAME));
    candidates
}

/// Build the layered Figment without extracting it.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hotroute/hotroute.toml`
/// 3. `~/.config/hotroute/hotroute.toml`
/// 4. `./hotroute.toml`
/// 5. `HOTROUTE_*` environment variables
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(HotrouteConfig::default()));
    for path in config_file_candidates() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<HotrouteConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an explicit file, still honouring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<HotrouteConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HotrouteConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HotrouteConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HotrouteConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// `HOTROUTE_` provider with an explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys themselves
/// contain underscores: `HOTROUTE_PLUGINS_HOT_RELOAD` must become
/// `plugins.hot_reload`, not `plugins.hot.reload`.
fn env_provider() -> Env {
    Env::prefixed("HOTROUTE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

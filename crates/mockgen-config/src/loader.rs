// SPDX-FileCopyrightText: 2026 Mockgen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mockgen.toml` > `~/.config/mockgen/mockgen.toml` >
//! `/etc/mockgen/mockgen.toml` with environment variable overrides via `MOCKGEN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MockgenConfig;

/// Top-level sections reachable from `MOCKGEN_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "server",
    "storage",
    "providers",
    "credits",
    "quota",
    "retention",
    "logging",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mockgen/mockgen.toml` (system-wide)
/// 3. `~/.config/mockgen/mockgen.toml` (user XDG config)
/// 4. `./mockgen.toml` (local directory)
/// 5. `MOCKGEN_*` environment variables
pub fn load_config() -> Result<MockgenConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults only.
pub fn load_config_from_str(toml_content: &str) -> Result<MockgenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MockgenConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MockgenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MockgenConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MockgenConfig::default()))
        .merge(Toml::file("/etc/mockgen/mockgen.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("mockgen/mockgen.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("mockgen.toml"))
        .merge(env_provider())
}

/// Environment provider mapping the first `_` after a known section to a dot.
///
/// `MOCKGEN_PROVIDERS_MAX_RETRIES` becomes `providers.max_retries`, never
/// `providers.max.retries`. Variables outside the known sections (such as
/// `MOCKGEN_API_KEY`) are not config keys and are skipped.
fn env_provider() -> Env {
    Env::prefixed("MOCKGEN_")
        .filter(|key| dotted_key(key.as_str()).is_some())
        .map(|key| {
            dotted_key(key.as_str())
                .unwrap_or_else(|| key.as_str().to_ascii_lowercase())
                .into()
        })
}

fn dotted_key(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| format!("{section}.{rest}"))
    })
}

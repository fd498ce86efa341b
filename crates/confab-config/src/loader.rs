// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./confab.toml` > `~/.config/confab/confab.toml` > `/etc/confab/confab.toml`
//! with environment variable overrides via `CONFAB_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ConfabConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/confab/confab.toml` (system-wide)
/// 3. `~/.config/confab/confab.toml` (user XDG config)
/// 4. `./confab.toml` (local directory)
/// 5. `CONFAB_*` environment variables
pub fn load_config() -> Result<ConfabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConfabConfig::default()))
        .merge(Toml::file("/etc/confab/confab.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("confab/confab.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("confab.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ConfabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConfabConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConfabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConfabConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CONFAB_GENERATION_API_TOKEN` must map
/// to `generation.api_token`, not `generation.api.token`.
fn env_provider() -> Env {
    Env::prefixed("CONFAB_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CONFAB_GENERATION_API_TOKEN -> "generation_api_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("generation_", "generation.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("server_", "server.", 1);
        mapped.into()
    })
}

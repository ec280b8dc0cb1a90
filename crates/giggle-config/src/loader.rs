// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./giggle.toml` > `~/.config/giggle/giggle.toml` > `/etc/giggle/giggle.toml`
//! with environment variable overrides via `GIGGLE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GiggleConfig;

const SYSTEM_CONFIG: &str = "/etc/giggle/giggle.toml";
const LOCAL_CONFIG: &str = "giggle.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/giggle/giggle.toml`
/// 3. `~/.config/giggle/giggle.toml`
/// 4. `./giggle.toml`
/// 5. `GIGGLE_*` environment variables
pub fn load_config() -> Result<GiggleConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<GiggleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GiggleConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GiggleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GiggleConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GiggleConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Candidate config files in merge order, for diagnostics.
pub fn config_paths() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from(SYSTEM_CONFIG)];
    if let Some(user) = user_config_path() {
        paths.push(user);
    }
    paths.push(
        std::env::current_dir()
            .map(|d| d.join(LOCAL_CONFIG))
            .unwrap_or_else(|_| LOCAL_CONFIG.into()),
    );
    paths
}

fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("giggle/giggle.toml"))
}

/// Maps `GIGGLE_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `GIGGLE_TELEGRAM_BOT_TOKEN`
/// must become `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("GIGGLE_").map(|key| map_env_key(key.as_str()).into())
}

/// Section-to-dot mapping for one lowercased, prefix-stripped env key.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ["agent", "telegram", "openai", "storage", "metrics"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

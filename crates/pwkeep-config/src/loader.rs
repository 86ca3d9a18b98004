// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pwkeep.toml` > `~/.config/pwkeep/pwkeep.toml` > `/etc/pwkeep/pwkeep.toml`
//! with environment variable overrides via `PWKEEP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PwkeepConfig;

/// Config sections that may be overridden from the environment.
const ENV_SECTIONS: &[&str] = &["keychain", "store", "log"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pwkeep/pwkeep.toml` (system-wide)
/// 3. `~/.config/pwkeep/pwkeep.toml` (user XDG config)
/// 4. `./pwkeep.toml` (local directory)
/// 5. `PWKEEP_*` environment variables
pub fn load_config() -> Result<PwkeepConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PwkeepConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PwkeepConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PwkeepConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PwkeepConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PwkeepConfig::default()))
        .merge(Toml::file("/etc/pwkeep/pwkeep.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("pwkeep/pwkeep.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("pwkeep.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Only `PWKEEP_<SECTION>_<KEY>` variables are considered, so unrelated ones
/// such as `PWKEEP_MASTER_PASSWORD` never reach deserialization. The first
/// underscore after the section becomes a dot: `PWKEEP_KEYCHAIN_PAD_BLOCK_SIZE`
/// maps to `keychain.pad_block_size`, not `keychain.pad.block.size`.
fn env_provider() -> Env {
    Env::prefixed("PWKEEP_")
        .filter(|key| {
            let key_str = key.as_str().to_ascii_lowercase();
            ENV_SECTIONS
                .iter()
                .any(|section| key_str.starts_with(&format!("{section}_")))
        })
        .map(|key| {
            let key_str = key.as_str().to_ascii_lowercase();
            let mapped = ENV_SECTIONS
                .iter()
                .find_map(|section| {
                    key_str
                        .strip_prefix(&format!("{section}_"))
                        .map(|rest| format!("{section}.{rest}"))
                })
                .unwrap_or(key_str);
            mapped.into()
        })
}

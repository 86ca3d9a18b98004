// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for pwkeep.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level pwkeep configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PwkeepConfig {
    /// Value padding settings.
    #[serde(default)]
    pub keychain: KeychainConfig,

    /// Where the persisted record and its checksum live.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Value padding settings.
///
/// Not persisted in the record; changing it only affects values written
/// afterwards, since padding is self-delimiting.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct KeychainConfig {
    /// Values shorter than this many bytes are padded up to it before
    /// encryption (default: 64).
    #[serde(default = "default_pad_block_size")]
    pub pad_block_size: usize,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self {
            pad_block_size: default_pad_block_size(),
        }
    }
}

fn default_pad_block_size() -> usize {
    64
}

/// Record persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the serialized keychain record.
    #[serde(default = "default_record_path")]
    pub record_path: String,

    /// Path to the trusted checksum sidecar. Empty means `<record_path>.sha256`.
    #[serde(default)]
    pub checksum_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            record_path: default_record_path(),
            checksum_path: String::new(),
        }
    }
}

impl StoreConfig {
    /// Resolve the checksum sidecar path.
    pub fn resolved_checksum_path(&self) -> PathBuf {
        if self.checksum_path.trim().is_empty() {
            PathBuf::from(format!("{}.sha256", self.record_path))
        } else {
            PathBuf::from(&self.checksum_path)
        }
    }
}

fn default_record_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("pwkeep").join("keychain.json"))
        .unwrap_or_else(|| PathBuf::from("keychain.json"))
        .to_string_lossy()
        .into_owned()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

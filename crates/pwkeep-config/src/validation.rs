// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as the pad block range and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::PwkeepConfig;

/// Largest pad block accepted from configuration.
pub const MAX_PAD_BLOCK_SIZE: usize = 4096;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PwkeepConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let block = config.keychain.pad_block_size;
    if block == 0 || block > MAX_PAD_BLOCK_SIZE {
        errors.push(ConfigError::Validation {
            message: format!(
                "keychain.pad_block_size must be between 1 and {MAX_PAD_BLOCK_SIZE}, got {block}"
            ),
        });
    }

    if config.store.record_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "store.record_path must not be empty".to_string(),
        });
    }

    if !config.store.checksum_path.trim().is_empty()
        && config.store.checksum_path.trim() == config.store.record_path.trim()
    {
        errors.push(ConfigError::Validation {
            message: "store.checksum_path must differ from store.record_path".to_string(),
        });
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = PwkeepConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_pad_block_fails_validation() {
        let mut config = PwkeepConfig::default();
        config.keychain.pad_block_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "pad_block_size"));
    }

    #[test]
    fn empty_record_path_fails_validation() {
        let mut config = PwkeepConfig::default();
        config.store.record_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "record_path"));
    }

    #[test]
    fn checksum_path_equal_to_record_path_fails() {
        let mut config = PwkeepConfig::default();
        config.store.record_path = "/tmp/kc.json".to_string();
        config.store.checksum_path = "/tmp/kc.json".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "checksum_path"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = PwkeepConfig::default();
        config.store.record_path = String::new();
        config.keychain.pad_block_size = 10_000;
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = PwkeepConfig::default();
        config.log.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}

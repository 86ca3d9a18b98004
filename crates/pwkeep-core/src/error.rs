// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the pwkeep keychain.

use thiserror::Error;

/// The primary error type used across keychain operations, persistence, and the CLI.
///
/// Messages never carry key material, passwords, service names, or stored values.
#[derive(Debug, Error)]
pub enum PwkeepError {
    /// An operation was invoked before a successful `init` or `load`.
    #[error("keychain not initialized")]
    NotInitialized,

    /// The cached integrity digest disagrees with the live entry store.
    #[error("rollback tampering detected -- entry store was modified outside the keychain")]
    RollbackDetected,

    /// Authenticated decryption failed (wrong key, corrupted ciphertext, or
    /// associated-data mismatch).
    #[error("decryption failed -- wrong key or corrupted entry")]
    Decryption,

    /// The trusted checksum supplied to `load` does not match the record.
    #[error("checksum mismatch -- record does not match its trusted checksum")]
    ChecksumMismatch,

    /// The supplied master password does not match the persisted signature.
    #[error("invalid master password")]
    Authentication,

    /// The persisted record failed strict schema or structural validation.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Cryptographic provider failures (randomness, key construction).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence backend errors (file I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Password or value acquisition failed.
    #[error("prompt error: {0}")]
    Prompt(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PwkeepError {
    /// Wrap an I/O (or other) failure as a storage error.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }
}

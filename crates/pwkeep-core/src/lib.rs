// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the pwkeep keychain.
//!
//! Provides the shared error type and the provider traits (randomness) that
//! the keychain, its persistence layer, and the CLI are written against.

pub mod error;
pub mod traits;

// Re-export key items at crate root for ergonomic imports.
pub use error::PwkeepError;
pub use traits::{RandomSource, SystemRandomSource};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pwkeep_error_has_all_variants() {
        let _not_init = PwkeepError::NotInitialized;
        let _rollback = PwkeepError::RollbackDetected;
        let _decrypt = PwkeepError::Decryption;
        let _checksum = PwkeepError::ChecksumMismatch;
        let _auth = PwkeepError::Authentication;
        let _malformed = PwkeepError::MalformedRecord("test".into());
        let _crypto = PwkeepError::Crypto("test".into());
        let _config = PwkeepError::Config("test".into());
        let _storage = PwkeepError::storage(std::io::Error::other("test"));
        let _prompt = PwkeepError::Prompt("test".into());
        let _internal = PwkeepError::Internal("test".into());
    }

    #[test]
    fn error_messages_are_actionable() {
        assert_eq!(
            PwkeepError::NotInitialized.to_string(),
            "keychain not initialized"
        );
        assert!(PwkeepError::Authentication.to_string().contains("password"));
        assert!(
            PwkeepError::MalformedRecord("missing field `kvs`".into())
                .to_string()
                .contains("missing field `kvs`")
        );
    }

    #[test]
    fn storage_error_wraps_source() {
        let err = PwkeepError::storage(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "record missing",
        ));
        assert!(err.to_string().contains("record missing"));
    }
}

// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password-derived, tamper-evident encrypted keychain.
//!
//! Two keys are derived from the master password with PBKDF2-HMAC-SHA256:
//! a MAC key that blinds credential names and signs the password, and an
//! AES-256-GCM key that encrypts padded values. The serialized record carries
//! only salts, the password signature, ciphertexts, and nonces. A SHA-256
//! digest over the entry map detects in-memory rollback or swapping, and a
//! checksum over the serialized record detects tampering at rest.

pub mod blind;
pub mod crypto;
pub mod integrity;
pub mod kdf;
pub mod keychain;
pub mod prompt;
pub mod record;
pub mod shared;
pub mod store;

pub use blind::BlindedId;
pub use keychain::Keychain;
pub use prompt::{get_master_password, get_master_password_with_confirm, read_secret_value};
pub use record::{PersistedRecord, checksum, verify_checksum};
pub use shared::SharedKeychain;
pub use store::{RecordStore, StoreLock, StoredRecord};

// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persisted keychain record and its trusted checksum.
//!
//! Decoding is strict: unknown or missing fields, wrong array lengths, an
//! unexpected version, malformed blinded ids, and entry/nonce tables that do
//! not line up are all rejected before any key is derived.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use pwkeep_core::PwkeepError;
use serde::{Deserialize, Serialize};

use crate::blind::{BlindedId, TAG_LEN};
use crate::crypto::NONCE_LEN;
use crate::integrity;
use crate::kdf::SALT_LEN;

/// Version tag written into every record.
pub const RECORD_VERSION: &str = "pwkeep keychain v1";

/// Blinded id -> AES-GCM ciphertext (with tag). Sorted by id, which fixes the
/// canonical serialization order.
pub type EntryMap = BTreeMap<BlindedId, Vec<u8>>;

/// Blinded id -> nonce used for that entry.
pub type NonceMap = BTreeMap<BlindedId, [u8; NONCE_LEN]>;

/// Everything that is written to disk or exported.
///
/// Contains no plaintext service names, values, or passwords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedRecord {
    pub version: String,
    /// Reserved. Generated and persisted but not used by key derivation.
    pub salt_master_key: [u8; SALT_LEN],
    pub salt_mac: [u8; SALT_LEN],
    pub salt_aes: [u8; SALT_LEN],
    pub password_sig: [u8; TAG_LEN],
    pub kvs: EntryMap,
    pub kvs_salts: NonceMap,
}

impl PersistedRecord {
    /// Canonical JSON form; maps serialize in blinded-id order.
    pub fn to_json(&self) -> Result<String, PwkeepError> {
        serde_json::to_string(self)
            .map_err(|e| PwkeepError::Internal(format!("failed to serialize record: {e}")))
    }

    /// Strictly decode and structurally validate a record.
    pub fn from_json(json: &str) -> Result<Self, PwkeepError> {
        let record: Self = serde_json::from_str(json)
            .map_err(|e| PwkeepError::MalformedRecord(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> Result<(), PwkeepError> {
        if self.version != RECORD_VERSION {
            return Err(PwkeepError::MalformedRecord(format!(
                "unsupported record version `{}`",
                self.version
            )));
        }
        if !self.kvs.keys().eq(self.kvs_salts.keys()) {
            return Err(PwkeepError::MalformedRecord(
                "kvs and kvs_salts must have identical keys".to_string(),
            ));
        }
        if let Some(id) = self
            .kvs
            .iter()
            .find_map(|(id, ct)| (ct.len() < crate::crypto::TAG_LEN).then_some(id))
        {
            return Err(PwkeepError::MalformedRecord(format!(
                "ciphertext for entry {id} is shorter than an authentication tag"
            )));
        }
        Ok(())
    }
}

/// Base64 SHA-256 of the serialized record.
pub fn checksum(record: &str) -> String {
    STANDARD.encode(integrity::sha256(record.as_bytes()))
}

/// Compare a record against a trusted checksum.
pub fn verify_checksum(record: &str, expected: &str) -> Result<(), PwkeepError> {
    if checksum(record) != expected {
        return Err(PwkeepError::ChecksumMismatch);
    }
    Ok(())
}

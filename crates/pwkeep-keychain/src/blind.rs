// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain blinding and the master-password signature, both HMAC-SHA256 under
//! the derived MAC key.

use std::fmt;

use pwkeep_core::PwkeepError;
use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::kdf::KEY_LEN;

/// Length of an HMAC-SHA256 tag.
pub const TAG_LEN: usize = 32;

/// Opaque, deterministic lookup key for a service name.
///
/// Always the lower-case hex encoding of a 32-byte tag. Deserialization
/// rejects anything else, so a decoded record only ever holds well-formed ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlindedId(String);

impl BlindedId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlindedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlindedId {
    type Error = PwkeepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let well_formed = value.len() == TAG_LEN * 2
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(PwkeepError::MalformedRecord(format!(
                "blinded id must be {} lower-case hex characters",
                TAG_LEN * 2
            )));
        }
        Ok(Self(value))
    }
}

impl From<BlindedId> for String {
    fn from(id: BlindedId) -> Self {
        id.0
    }
}

fn mac_key(key: &[u8; KEY_LEN]) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, key)
}

/// Map a service name to its blinded id.
pub fn blind(key: &[u8; KEY_LEN], name: &str) -> BlindedId {
    let tag = hmac::sign(&mac_key(key), name.as_bytes());
    BlindedId(hex::encode(tag.as_ref()))
}

/// Compute the persisted signature of the master password.
pub fn sign_password(key: &[u8; KEY_LEN], password: &[u8]) -> [u8; TAG_LEN] {
    let tag = hmac::sign(&mac_key(key), password);
    let mut sig = [0u8; TAG_LEN];
    sig.copy_from_slice(tag.as_ref());
    sig
}

/// Constant-time check of a password against its persisted signature.
pub fn verify_password(key: &[u8; KEY_LEN], password: &[u8], sig: &[u8; TAG_LEN]) -> bool {
    hmac::verify(&mac_key(key), password, sig).is_ok()
}

// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rollback detection over the encrypted entry store.
//!
//! The guard caches SHA-256 of the canonical entry-store serialization. Any
//! change to the store that did not go through the keychain leaves the cache
//! stale, and the next checked operation refuses to run.

use pwkeep_core::PwkeepError;
use ring::digest;

use crate::record::EntryMap;

/// A SHA-256 digest.
pub type Digest = [u8; 32];

/// SHA-256 of arbitrary bytes.
pub fn sha256(bytes: &[u8]) -> Digest {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest::digest(&digest::SHA256, bytes).as_ref());
    out
}

/// Digest of the canonical (sorted, JSON) serialization of the entry store.
///
/// This is the same serialization used inside the persisted record.
pub fn digest_entries(kvs: &EntryMap) -> Result<Digest, PwkeepError> {
    let canonical = serde_json::to_vec(kvs)
        .map_err(|e| PwkeepError::Internal(format!("failed to serialize entry store: {e}")))?;
    Ok(sha256(&canonical))
}

/// In-memory cache of the last committed entry-store digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityGuard {
    cached: Digest,
}

impl IntegrityGuard {
    /// Start tracking the given store.
    pub fn new(kvs: &EntryMap) -> Result<Self, PwkeepError> {
        Ok(Self {
            cached: digest_entries(kvs)?,
        })
    }

    /// Fail with `RollbackDetected` if `kvs` no longer matches the cache.
    pub fn verify(&self, kvs: &EntryMap) -> Result<(), PwkeepError> {
        if digest_entries(kvs)? != self.cached {
            return Err(PwkeepError::RollbackDetected);
        }
        Ok(())
    }

    /// Recompute the cache after a committed mutation.
    pub fn update(&mut self, kvs: &EntryMap) -> Result<Digest, PwkeepError> {
        self.cached = digest_entries(kvs)?;
        Ok(self.cached)
    }
}

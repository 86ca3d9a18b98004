// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keychain lifecycle: init, load, get, set, remove, and dump.
//!
//! - Two keys are derived from the master password with PBKDF2: a MAC key
//!   that blinds service names and signs the password, and an AES key that
//!   encrypts values.
//! - Entries are stored under their blinded id, encrypted with AES-256-GCM
//!   and bound to the service name as associated data.
//! - A cached digest of the entry store is checked before every read and
//!   write, so edits made behind the keychain's back are refused.

use std::fmt;
use std::sync::Arc;

use pwkeep_config::KeychainConfig;
use pwkeep_core::{PwkeepError, RandomSource, SystemRandomSource};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::blind;
use crate::crypto;
use crate::integrity::IntegrityGuard;
use crate::kdf::{self, MasterSecrets};
use crate::record::{self, NonceMap, PersistedRecord, RECORD_VERSION};

#[cfg(test)]
use crate::record::EntryMap;

/// An unlocked keychain.
///
/// Debug output intentionally omits the derived keys.
pub struct Keychain {
    /// Derived keys -- only in memory, never serialized.
    secrets: MasterSecrets,
    /// Salts, password signature, and the encrypted tables.
    record: PersistedRecord,
    integrity: IntegrityGuard,
    config: KeychainConfig,
    rng: Arc<dyn RandomSource>,
}

impl fmt::Debug for Keychain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keychain")
            .field("secrets", &"[REDACTED]")
            .field("entries", &self.record.kvs.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Keychain {
    /// Create an empty keychain protected by `password`, with fresh salts.
    pub fn init(password: &SecretString, config: &KeychainConfig) -> Result<Self, PwkeepError> {
        Self::init_with_rng(password, config, Arc::new(SystemRandomSource::new()))
    }

    /// [`Keychain::init`] with an explicit randomness source.
    pub fn init_with_rng(
        password: &SecretString,
        config: &KeychainConfig,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self, PwkeepError> {
        Self::create(password, config, rng, kdf::PBKDF2_ITERATIONS)
    }

    fn create(
        password: &SecretString,
        config: &KeychainConfig,
        rng: Arc<dyn RandomSource>,
        iterations: u32,
    ) -> Result<Self, PwkeepError> {
        let salt_master_key = kdf::generate_salt(rng.as_ref())?;
        let salt_mac = kdf::generate_salt(rng.as_ref())?;
        let salt_aes = kdf::generate_salt(rng.as_ref())?;

        let password = password.expose_secret().as_bytes();
        let secrets = kdf::derive_secrets(password, &salt_mac, &salt_aes, iterations)?;
        let password_sig = blind::sign_password(secrets.mac_key(), password);

        let record = PersistedRecord {
            version: RECORD_VERSION.to_string(),
            salt_master_key,
            salt_mac,
            salt_aes,
            password_sig,
            kvs: Default::default(),
            kvs_salts: NonceMap::new(),
        };
        let integrity = IntegrityGuard::new(&record.kvs)?;

        info!("keychain initialized");
        Ok(Self {
            secrets,
            record,
            integrity,
            config: config.clone(),
            rng,
        })
    }

    /// Restore a keychain from a serialized record.
    ///
    /// When `checksum` is given it is checked before anything else. The record
    /// is then strictly decoded, keys are re-derived from the persisted salts,
    /// and the password signature must match.
    pub fn load(
        password: &SecretString,
        serialized: &str,
        checksum: Option<&str>,
        config: &KeychainConfig,
    ) -> Result<Self, PwkeepError> {
        Self::load_with_rng(
            password,
            serialized,
            checksum,
            config,
            Arc::new(SystemRandomSource::new()),
        )
    }

    /// [`Keychain::load`] with an explicit randomness source.
    pub fn load_with_rng(
        password: &SecretString,
        serialized: &str,
        checksum: Option<&str>,
        config: &KeychainConfig,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self, PwkeepError> {
        Self::restore(
            password,
            serialized,
            checksum,
            config,
            rng,
            kdf::PBKDF2_ITERATIONS,
        )
    }

    fn restore(
        password: &SecretString,
        serialized: &str,
        checksum: Option<&str>,
        config: &KeychainConfig,
        rng: Arc<dyn RandomSource>,
        iterations: u32,
    ) -> Result<Self, PwkeepError> {
        if let Some(expected) = checksum {
            record::verify_checksum(serialized, expected).inspect_err(|_| {
                warn!("keychain load rejected: checksum mismatch");
            })?;
        }

        let record = PersistedRecord::from_json(serialized)?;

        let password = password.expose_secret().as_bytes();
        let secrets =
            kdf::derive_secrets(password, &record.salt_mac, &record.salt_aes, iterations)?;

        if !blind::verify_password(secrets.mac_key(), password, &record.password_sig) {
            warn!("keychain load rejected: password signature mismatch");
            return Err(PwkeepError::Authentication);
        }

        let integrity = IntegrityGuard::new(&record.kvs)?;

        debug!(entries = record.kvs.len(), "keychain loaded");
        Ok(Self {
            secrets,
            record,
            integrity,
            config: config.clone(),
            rng,
        })
    }

    /// Look up and decrypt the value stored for `name`.
    ///
    /// Returns `Ok(None)` when nothing is stored under that name.
    pub fn get(&self, name: &str) -> Result<Option<SecretString>, PwkeepError> {
        self.integrity.verify(&self.record.kvs)?;

        let id = blind::blind(self.secrets.mac_key(), name);
        let Some(ciphertext) = self.record.kvs.get(&id) else {
            return Ok(None);
        };
        let nonce = self
            .record
            .kvs_salts
            .get(&id)
            .ok_or(PwkeepError::Decryption)?;

        let padded = crypto::open(self.secrets.aes_key(), name.as_bytes(), nonce, ciphertext)?;
        let value = crypto::unpad(&padded)?;
        let value = std::str::from_utf8(value).map_err(|_| PwkeepError::Decryption)?;

        Ok(Some(SecretString::from(value.to_owned())))
    }

    /// Store `value` under `name`, replacing any previous value.
    ///
    /// Nothing is committed unless encryption succeeds.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), PwkeepError> {
        self.integrity.verify(&self.record.kvs)?;

        let id = blind::blind(self.secrets.mac_key(), name);
        let padded = crypto::pad(value.as_bytes(), self.config.pad_block_size);
        let (nonce, ciphertext) = crypto::seal(
            self.secrets.aes_key(),
            name.as_bytes(),
            &padded,
            self.rng.as_ref(),
        )?;

        let previous = self
            .record
            .kvs
            .insert(id.clone(), ciphertext)
            .zip(self.record.kvs_salts.insert(id.clone(), nonce));

        if let Err(e) = self.integrity.update(&self.record.kvs) {
            match previous {
                Some((ciphertext, nonce)) => {
                    self.record.kvs.insert(id.clone(), ciphertext);
                    self.record.kvs_salts.insert(id, nonce);
                }
                None => {
                    self.record.kvs.remove(&id);
                    self.record.kvs_salts.remove(&id);
                }
            }
            return Err(e);
        }

        debug!(entries = self.record.kvs.len(), "entry stored");
        Ok(())
    }

    /// Delete the entry for `name`. Returns whether one existed.
    pub fn remove(&mut self, name: &str) -> Result<bool, PwkeepError> {
        let id = blind::blind(self.secrets.mac_key(), name);
        let Some(ciphertext) = self.record.kvs.remove(&id) else {
            return Ok(false);
        };
        let nonce = self.record.kvs_salts.remove(&id);

        if let Err(e) = self.integrity.update(&self.record.kvs) {
            self.record.kvs.insert(id.clone(), ciphertext);
            if let Some(nonce) = nonce {
                self.record.kvs_salts.insert(id, nonce);
            }
            return Err(e);
        }

        debug!(entries = self.record.kvs.len(), "entry removed");
        Ok(true)
    }

    /// Serialize the keychain and return `(record, checksum)`.
    ///
    /// The checksum is meant to be kept somewhere trusted and passed back to
    /// [`Keychain::load`].
    pub fn dump(&self) -> Result<(String, String), PwkeepError> {
        let serialized = self.record.to_json()?;
        let checksum = record::checksum(&serialized);
        debug!(entries = self.record.kvs.len(), "keychain dumped");
        Ok((serialized, checksum))
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.record.kvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.kvs.is_empty()
    }

    /// [`Keychain::init`] with a reduced work factor.
    #[cfg(test)]
    pub(crate) fn init_with_iterations(
        password: &SecretString,
        config: &KeychainConfig,
        rng: Arc<dyn RandomSource>,
        iterations: u32,
    ) -> Result<Self, PwkeepError> {
        Self::create(password, config, rng, iterations)
    }

    /// [`Keychain::load`] with a reduced work factor.
    #[cfg(test)]
    pub(crate) fn load_with_iterations(
        password: &SecretString,
        serialized: &str,
        checksum: Option<&str>,
        config: &KeychainConfig,
        iterations: u32,
    ) -> Result<Self, PwkeepError> {
        Self::restore(
            password,
            serialized,
            checksum,
            config,
            Arc::new(SystemRandomSource::new()),
            iterations,
        )
    }

    /// Direct access to the encrypted table, bypassing the keychain.
    #[cfg(test)]
    pub(crate) fn entries_mut(&mut self) -> &mut EntryMap {
        &mut self.record.kvs
    }
}

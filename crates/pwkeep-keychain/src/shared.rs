// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A cloneable, lock-guarded keychain handle for async callers.
//!
//! The handle starts uninitialized and becomes ready after a successful
//! `init` or `load`; every entry operation before that fails with
//! `NotInitialized`. Reads share the lock, while writes hold it exclusively for
//! the whole verify, encrypt, and commit sequence, so two mutations can
//! never both validate against the same stale digest.

use std::sync::Arc;

use pwkeep_config::KeychainConfig;
use pwkeep_core::PwkeepError;
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::debug;

use crate::keychain::Keychain;

#[derive(Debug, Clone, Default)]
pub struct SharedKeychain {
    inner: Arc<RwLock<Option<Keychain>>>,
}

impl From<Keychain> for SharedKeychain {
    fn from(keychain: Keychain) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(keychain))),
        }
    }
}

impl SharedKeychain {
    /// An uninitialized handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh keychain, replacing whatever the handle held.
    ///
    /// Key derivation runs on the blocking pool.
    pub async fn init(
        &self,
        password: SecretString,
        config: KeychainConfig,
    ) -> Result<(), PwkeepError> {
        let mut guard = self.inner.write().await;
        let keychain =
            tokio::task::spawn_blocking(move || Keychain::init(&password, &config))
                .await
                .map_err(join_err)??;
        *guard = Some(keychain);
        debug!("keychain initialized");
        Ok(())
    }

    /// Restore a keychain from a serialized record.
    ///
    /// On failure the handle keeps its previous state.
    pub async fn load(
        &self,
        password: SecretString,
        serialized: String,
        checksum: Option<String>,
        config: KeychainConfig,
    ) -> Result<(), PwkeepError> {
        let mut guard = self.inner.write().await;
        let keychain = tokio::task::spawn_blocking(move || {
            Keychain::load(&password, &serialized, checksum.as_deref(), &config)
        })
        .await
        .map_err(join_err)??;
        *guard = Some(keychain);
        debug!("keychain loaded");
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<Option<SecretString>, PwkeepError> {
        let guard = self.inner.read().await;
        ready(&guard)?.get(name)
    }

    pub async fn set(&self, name: &str, value: &str) -> Result<(), PwkeepError> {
        let mut guard = self.inner.write().await;
        guard.as_mut().ok_or(PwkeepError::NotInitialized)?.set(name, value)
    }

    pub async fn remove(&self, name: &str) -> Result<bool, PwkeepError> {
        let mut guard = self.inner.write().await;
        guard.as_mut().ok_or(PwkeepError::NotInitialized)?.remove(name)
    }

    pub async fn dump(&self) -> Result<(String, String), PwkeepError> {
        let guard = self.inner.read().await;
        ready(&guard)?.dump()
    }

    pub async fn len(&self) -> Result<usize, PwkeepError> {
        let guard = self.inner.read().await;
        Ok(ready(&guard)?.len())
    }
}

fn ready(slot: &Option<Keychain>) -> Result<&Keychain, PwkeepError> {
    slot.as_ref().ok_or(PwkeepError::NotInitialized)
}

fn join_err(e: tokio::task::JoinError) -> PwkeepError {
    PwkeepError::Internal(format!("key derivation task failed: {e}"))
}

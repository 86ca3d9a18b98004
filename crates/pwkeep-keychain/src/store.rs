// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File persistence for the serialized record and its checksum sidecar.
//!
//! Both files are replaced atomically (write to `*.tmp`, then rename). The
//! record is written before the checksum, so an interrupted save leaves a
//! pair that fails the checksum test instead of one that silently loads.
//!
//! Read-modify-write sequences take an advisory lock on `<record>.lock` so
//! two processes cannot both load the same record and overwrite each other.

use std::path::{Path, PathBuf};

use pwkeep_config::StoreConfig;
use pwkeep_core::PwkeepError;
use tracing::{debug, warn};

/// A record read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub record: String,
    /// `None` when the sidecar is missing.
    pub checksum: Option<String>,
}

/// Location of a persisted keychain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStore {
    record_path: PathBuf,
    checksum_path: PathBuf,
}

impl RecordStore {
    pub fn new(record_path: impl Into<PathBuf>, checksum_path: impl Into<PathBuf>) -> Self {
        Self {
            record_path: record_path.into(),
            checksum_path: checksum_path.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.record_path, config.resolved_checksum_path())
    }

    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    pub fn checksum_path(&self) -> &Path {
        &self.checksum_path
    }

    /// Sibling file that [`RecordStore::lock`] locks.
    pub fn lock_path(&self) -> PathBuf {
        let mut path = self.record_path.as_os_str().to_owned();
        path.push(".lock");
        PathBuf::from(path)
    }

    /// Wait for exclusive access to this store.
    ///
    /// Hold the guard from the read that starts a mutation until its save
    /// completes.
    pub async fn lock(&self) -> Result<StoreLock, PwkeepError> {
        let path = self.lock_path();
        let guard = tokio::task::spawn_blocking(move || StoreLock::acquire(&path))
            .await
            .map_err(|e| PwkeepError::Internal(format!("store lock task failed: {e}")))??;
        debug!(path = %self.record_path.display(), "store locked");
        Ok(guard)
    }

    /// Check if a record has been saved.
    pub async fn exists(&self) -> Result<bool, PwkeepError> {
        tokio::fs::try_exists(&self.record_path)
            .await
            .map_err(PwkeepError::storage)
    }

    /// Persist a record and its checksum.
    pub async fn save(&self, record: &str, checksum: &str) -> Result<(), PwkeepError> {
        write_atomic(&self.record_path, record.as_bytes()).await?;
        write_atomic(&self.checksum_path, format!("{checksum}\n").as_bytes()).await?;
        debug!(path = %self.record_path.display(), "keychain record saved");
        Ok(())
    }

    /// Read the record and checksum back. Returns `Ok(None)` if no record exists.
    pub async fn read(&self) -> Result<Option<StoredRecord>, PwkeepError> {
        let Some(record) = read_optional(&self.record_path).await? else {
            return Ok(None);
        };

        let checksum = read_optional(&self.checksum_path)
            .await?
            .map(|c| c.trim().to_string());
        if checksum.is_none() {
            warn!(
                path = %self.checksum_path.display(),
                "checksum sidecar missing -- record will load without tamper check"
            );
        }

        Ok(Some(StoredRecord { record, checksum }))
    }
}

/// Exclusive advisory lock on a store, released on drop.
#[derive(Debug)]
pub struct StoreLock {
    // flock is released when the descriptor is closed.
    _file: std::fs::File,
}

impl StoreLock {
    fn acquire(path: &Path) -> Result<Self, PwkeepError> {
        create_parent(path)?;
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(PwkeepError::storage)?;
        lock_exclusive(&file).map_err(PwkeepError::storage)?;
        Ok(Self { _file: file })
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

fn create_parent(path: &Path) -> Result<(), PwkeepError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(PwkeepError::storage)?;
        }
    }
    Ok(())
}

async fn read_optional(path: &Path) -> Result<Option<String>, PwkeepError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PwkeepError::storage(e)),
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PwkeepError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(PwkeepError::storage)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents)
        .await
        .map_err(PwkeepError::storage)?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(PwkeepError::storage)
}

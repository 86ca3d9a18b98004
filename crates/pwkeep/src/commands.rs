// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Passwords and values are passed in already acquired, so every command can
//! be driven from tests without a TTY.

use std::path::{Path, PathBuf};

use pwkeep_config::KeychainConfig;
use pwkeep_core::PwkeepError;
use pwkeep_keychain::{RecordStore, SharedKeychain};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

/// Show only the first and last four characters of a secret.
///
/// Values shorter than 10 characters are fully masked.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Sidecar location used for exported records.
pub fn export_checksum_path(path: &Path) -> PathBuf {
    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(".sha256");
    PathBuf::from(sidecar)
}

/// Load the keychain persisted in `store`, verifying its checksum sidecar.
pub async fn open(
    store: &RecordStore,
    config: &KeychainConfig,
    password: SecretString,
) -> Result<SharedKeychain, PwkeepError> {
    let stored = store.read().await?.ok_or(PwkeepError::NotInitialized)?;
    let keychain = SharedKeychain::new();
    keychain
        .load(password, stored.record, stored.checksum, config.clone())
        .await?;
    Ok(keychain)
}

async fn persist(store: &RecordStore, keychain: &SharedKeychain) -> Result<(), PwkeepError> {
    let (record, checksum) = keychain.dump().await?;
    store.save(&record, &checksum).await
}

/// `pwkeep init`: create an empty keychain.
pub async fn run_init(
    store: &RecordStore,
    config: &KeychainConfig,
    password: SecretString,
    force: bool,
) -> Result<(), PwkeepError> {
    let _guard = store.lock().await?;
    if !force && store.exists().await? {
        return Err(PwkeepError::storage(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "a keychain already exists at {} (use --force to replace it)",
                store.record_path().display()
            ),
        )));
    }

    let keychain = SharedKeychain::new();
    keychain.init(password, config.clone()).await?;
    persist(store, &keychain).await?;
    info!(path = %store.record_path().display(), "keychain created");
    Ok(())
}

/// `pwkeep set`: store or replace a value.
pub async fn run_set(
    store: &RecordStore,
    config: &KeychainConfig,
    password: SecretString,
    name: &str,
    value: &SecretString,
) -> Result<(), PwkeepError> {
    let _guard = store.lock().await?;
    let keychain = open(store, config, password).await?;
    keychain.set(name, value.expose_secret()).await?;
    persist(store, &keychain).await
}

/// `pwkeep get`: the decrypted value, masked on request.
pub async fn run_get(
    store: &RecordStore,
    config: &KeychainConfig,
    password: SecretString,
    name: &str,
    mask: bool,
) -> Result<Option<String>, PwkeepError> {
    let keychain = open(store, config, password).await?;
    let value = keychain.get(name).await?;
    Ok(value.map(|v| {
        if mask {
            mask_secret(v.expose_secret())
        } else {
            v.expose_secret().to_string()
        }
    }))
}

/// `pwkeep remove`: returns whether an entry existed.
pub async fn run_remove(
    store: &RecordStore,
    config: &KeychainConfig,
    password: SecretString,
    name: &str,
) -> Result<bool, PwkeepError> {
    let _guard = store.lock().await?;
    let keychain = open(store, config, password).await?;
    let removed = keychain.remove(name).await?;
    if removed {
        persist(store, &keychain).await?;
    }
    Ok(removed)
}

/// `pwkeep export`: write the record (and a checksum sidecar) to `path`.
///
/// Returns the checksum, which should be kept somewhere trusted.
pub async fn run_export(
    store: &RecordStore,
    config: &KeychainConfig,
    password: SecretString,
    path: &Path,
) -> Result<String, PwkeepError> {
    let keychain = open(store, config, password).await?;
    let (record, checksum) = keychain.dump().await?;
    RecordStore::new(path, export_checksum_path(path))
        .save(&record, &checksum)
        .await?;
    info!(path = %path.display(), "keychain exported");
    Ok(checksum)
}

/// `pwkeep import`: verify a record by loading it, then make it the stored keychain.
///
/// The checksum comes from `checksum` or, failing that, the sidecar next to `path`.
pub async fn run_import(
    store: &RecordStore,
    config: &KeychainConfig,
    password: SecretString,
    path: &Path,
    checksum: Option<String>,
) -> Result<usize, PwkeepError> {
    let source = RecordStore::new(path, export_checksum_path(path));
    let stored = source.read().await?.ok_or_else(|| {
        PwkeepError::storage(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no record at {}", path.display()),
        ))
    })?;

    let keychain = SharedKeychain::new();
    keychain
        .load(
            password,
            stored.record,
            checksum.or(stored.checksum),
            config.clone(),
        )
        .await?;

    let _guard = store.lock().await?;
    persist(store, &keychain).await?;

    let entries = keychain.len().await?;
    info!(entries, "keychain imported");
    Ok(entries)
}

/// `pwkeep verify`: load with the sidecar checksum and report the entry count.
pub async fn run_verify(
    store: &RecordStore,
    config: &KeychainConfig,
    password: SecretString,
) -> Result<usize, PwkeepError> {
    open(store, config, password).await?.len().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config() -> KeychainConfig {
        KeychainConfig { pad_block_size: 64 }
    }

    fn pw() -> SecretString {
        SecretString::from("password123!".to_string())
    }

    fn value(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn store_in(dir: &TempDir) -> RecordStore {
        let record = dir.path().join("keychain.json");
        RecordStore::new(&record, export_checksum_path(&record))
    }

    #[test]
    fn mask_secret_long_value() {
        assert_eq!(mask_secret("sk-ant-REDACTED"), "sk-a...mnop");
    }

    #[test]
    fn mask_secret_short_value() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret("123456789"), "****");
    }

    #[test]
    fn mask_secret_counts_characters_not_bytes() {
        assert_eq!(mask_secret("ééééxxxxxxüüüü"), "éééé...üüüü");
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        run_init(&store, &test_config(), pw(), false).await.unwrap();

        let again = run_init(&store, &test_config(), pw(), false).await;
        assert!(matches!(again, Err(PwkeepError::Storage { .. })));

        run_init(&store, &test_config(), pw(), true).await.unwrap();
    }

    #[tokio::test]
    async fn commands_before_init_report_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let result = run_get(&store, &test_config(), pw(), "a", false).await;
        assert!(matches!(result, Err(PwkeepError::NotInitialized)));
    }

    #[tokio::test]
    async fn set_get_remove_persist_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let config = test_config();
        run_init(&store, &config, pw(), false).await.unwrap();

        run_set(&store, &config, pw(), "www.example.com", &value("secretpw"))
            .await
            .unwrap();
        assert_eq!(
            run_get(&store, &config, pw(), "www.example.com", false)
                .await
                .unwrap()
                .as_deref(),
            Some("secretpw")
        );
        assert_eq!(run_verify(&store, &config, pw()).await.unwrap(), 1);

        assert!(run_remove(&store, &config, pw(), "www.example.com").await.unwrap());
        assert!(!run_remove(&store, &config, pw(), "www.example.com").await.unwrap());
        assert!(
            run_get(&store, &config, pw(), "www.example.com", false)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sets_on_one_store_keep_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        run_init(&store, &test_config(), pw(), false).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..4 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                run_set(&store, &test_config(), pw(), &format!("site{i}"), &value("v")).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(run_verify(&store, &test_config(), pw()).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn get_with_mask_hides_middle() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let config = test_config();
        run_init(&store, &config, pw(), false).await.unwrap();
        run_set(&store, &config, pw(), "api", &value("sk-ant-REDACTED"))
            .await
            .unwrap();

        let masked = run_get(&store, &config, pw(), "api", true).await.unwrap();
        assert_eq!(masked.as_deref(), Some("sk-a...mnop"));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        run_init(&store, &test_config(), pw(), false).await.unwrap();

        let result = run_verify(&store, &test_config(), value("nope")).await;
        assert!(matches!(result, Err(PwkeepError::Authentication)));
    }

    #[tokio::test]
    async fn export_then_import_into_new_store() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        let src = store_in(&src_dir);
        let dst = store_in(&dst_dir);
        let config = test_config();

        run_init(&src, &config, pw(), false).await.unwrap();
        run_set(&src, &config, pw(), "a", &value("1")).await.unwrap();
        run_set(&src, &config, pw(), "b", &value("2")).await.unwrap();

        let export_path = src_dir.path().join("backup.json");
        let checksum = run_export(&src, &config, pw(), &export_path).await.unwrap();
        assert!(export_checksum_path(&export_path).exists());

        let imported = run_import(&dst, &config, pw(), &export_path, Some(checksum))
            .await
            .unwrap();
        assert_eq!(imported, 2);
        assert_eq!(
            run_get(&dst, &config, pw(), "b", false).await.unwrap().as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn import_with_forged_checksum_stores_nothing() {
        let src_dir = tempfile::tempdir().unwrap();
        let dst_dir = tempfile::tempdir().unwrap();
        let src = store_in(&src_dir);
        let dst = store_in(&dst_dir);
        let config = test_config();

        run_init(&src, &config, pw(), false).await.unwrap();
        let export_path = src_dir.path().join("backup.json");
        run_export(&src, &config, pw(), &export_path).await.unwrap();

        let result = run_import(
            &dst,
            &config,
            pw(),
            &export_path,
            Some("forged".to_string()),
        )
        .await;
        assert!(matches!(result, Err(PwkeepError::ChecksumMismatch)));
        assert!(!dst.exists().await.unwrap());
    }

    #[tokio::test]
    async fn import_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let result = run_import(
            &store,
            &test_config(),
            pw(),
            &dir.path().join("absent.json"),
            None,
        )
        .await;
        assert!(matches!(result, Err(PwkeepError::Storage { .. })));
    }
}

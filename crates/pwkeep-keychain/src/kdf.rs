// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2-HMAC-SHA256 derivation of the master MAC and AES keys.
//!
//! The password is stretched once per salt, so the two keys are independent
//! even though they come from the same password.

use std::fmt;
use std::num::NonZeroU32;

use pwkeep_core::{PwkeepError, RandomSource};
use ring::pbkdf2;
use zeroize::Zeroizing;

/// Length of every persisted salt.
pub const SALT_LEN: usize = 16;

/// Length of each derived key (256 bits).
pub const KEY_LEN: usize = 32;

/// PBKDF2 work factor for every keychain.
///
/// Not recorded in the persisted record, so it must never change.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// The two symmetric keys derived from the master password.
///
/// Only ever held in memory. Both keys are zeroed on drop and redacted from
/// `Debug` output.
pub struct MasterSecrets {
    mac_key: Zeroizing<[u8; KEY_LEN]>,
    aes_key: Zeroizing<[u8; KEY_LEN]>,
}

impl MasterSecrets {
    /// Key for domain blinding and the password signature.
    pub fn mac_key(&self) -> &[u8; KEY_LEN] {
        &self.mac_key
    }

    /// Key for AES-256-GCM entry encryption.
    pub fn aes_key(&self) -> &[u8; KEY_LEN] {
        &self.aes_key
    }
}

impl fmt::Debug for MasterSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterSecrets")
            .field("mac_key", &"[REDACTED]")
            .field("aes_key", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 32-byte key from `password` and `salt`.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    iterations: u32,
) -> Result<Zeroizing<[u8; KEY_LEN]>, PwkeepError> {
    let iterations = NonZeroU32::new(iterations)
        .ok_or_else(|| PwkeepError::Config("PBKDF2 iteration count must be non-zero".to_string()))?;

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        password,
        &mut output[..],
    );
    Ok(output)
}

/// Derive both master keys. A wrong password yields different keys without
/// any error; the mismatch surfaces when the password signature is checked.
pub fn derive_secrets(
    password: &[u8],
    salt_mac: &[u8; SALT_LEN],
    salt_aes: &[u8; SALT_LEN],
    iterations: u32,
) -> Result<MasterSecrets, PwkeepError> {
    Ok(MasterSecrets {
        mac_key: derive_key(password, salt_mac, iterations)?,
        aes_key: derive_key(password, salt_aes, iterations)?,
    })
}

/// Generate a random 16-byte salt.
pub fn generate_salt(rng: &dyn RandomSource) -> Result<[u8; SALT_LEN], PwkeepError> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwkeep_core::SystemRandomSource;

    // Low cost for fast tests.
    const ITERATIONS: u32 = 1_000;

    #[test]
    fn derive_key_produces_consistent_output() {
        let salt = [1u8; SALT_LEN];
        let key1 = derive_key(b"test password", &salt, ITERATIONS).unwrap();
        let key2 = derive_key(b"test password", &salt, ITERATIONS).unwrap();

        assert_eq!(*key1, *key2);
    }

    #[test]
    fn different_password_produces_different_key() {
        let salt = [2u8; SALT_LEN];
        let key1 = derive_key(b"password one", &salt, ITERATIONS).unwrap();
        let key2 = derive_key(b"password two", &salt, ITERATIONS).unwrap();

        assert_ne!(*key1, *key2);
    }

    #[test]
    fn different_iterations_produce_different_key() {
        let salt = [3u8; SALT_LEN];
        let key1 = derive_key(b"same", &salt, ITERATIONS).unwrap();
        let key2 = derive_key(b"same", &salt, ITERATIONS + 1).unwrap();

        assert_ne!(*key1, *key2);
    }

    #[test]
    fn mac_and_aes_keys_are_independent() {
        let secrets = derive_secrets(b"password", &[4u8; SALT_LEN], &[5u8; SALT_LEN], ITERATIONS)
            .unwrap();
        assert_ne!(secrets.mac_key(), secrets.aes_key());
    }

    #[test]
    fn zero_iterations_is_rejected() {
        assert!(derive_key(b"password", &[0u8; SALT_LEN], 0).is_err());
    }

    #[test]
    fn debug_output_redacts_keys() {
        let secrets = derive_secrets(b"password", &[6u8; SALT_LEN], &[7u8; SALT_LEN], ITERATIONS)
            .unwrap();
        let debug = format!("{secrets:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&format!("{:?}", secrets.mac_key())));
    }

    #[test]
    fn generate_salt_produces_random_values() {
        let rng = SystemRandomSource::new();
        let salt1 = generate_salt(&rng).unwrap();
        let salt2 = generate_salt(&rng).unwrap();

        assert_ne!(salt1, salt2);
    }

    #[test]
    fn derive_key_matches_known_answer() {
        let salt: [u8; SALT_LEN] = std::array::from_fn(|i| i as u8);
        let key = derive_key(b"password123!", &salt, ITERATIONS).unwrap();
        assert_eq!(
            hex::encode(*key),
            "aaf39708c8e69b6af1c6a6159f1afa6f50ea94dd014200f45a263d60fd41ef4f"
        );
    }

    #[test]
    fn derive_key_at_fixed_work_factor_matches_known_answer() {
        let salt: [u8; SALT_LEN] = std::array::from_fn(|i| i as u8);
        let key = derive_key(b"password123!", &salt, PBKDF2_ITERATIONS).unwrap();
        assert_eq!(
            hex::encode(*key),
            "436e406609f9c9eee9fdacb1629b5d003f79a62a0f5f2e373d1fb29c7dc1a32f"
        );
    }

    #[test]
    fn derive_secrets_uses_one_salt_per_key() {
        let salt_mac = [0x11u8; SALT_LEN];
        let salt_aes = [0x22u8; SALT_LEN];
        let secrets = derive_secrets(b"pw", &salt_mac, &salt_aes, ITERATIONS).unwrap();

        assert_eq!(*secrets.mac_key(), *derive_key(b"pw", &salt_mac, ITERATIONS).unwrap());
        assert_eq!(*secrets.aes_key(), *derive_key(b"pw", &salt_aes, ITERATIONS).unwrap());
    }
}

// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-entry value encryption: length-masking padding plus AES-256-GCM.
//!
//! Every call to [`seal`] draws a fresh random 96-bit nonce. Nonce reuse would
//! be catastrophic for GCM security. The service name is bound in as
//! associated data, so a ciphertext moved under another entry fails to open.

use pwkeep_core::{PwkeepError, RandomSource};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use zeroize::Zeroizing;

use crate::kdf::KEY_LEN;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Marks the end of the value inside a padded buffer.
pub const PAD_SENTINEL: u8 = 0x80;

/// Append the sentinel, then zero bytes up to `block` bytes.
///
/// Values that already reach `block` with the sentinel get no zero bytes;
/// nothing is ever truncated.
pub fn pad(value: &[u8], block: usize) -> Zeroizing<Vec<u8>> {
    let mut padded = Zeroizing::new(Vec::with_capacity(block.max(value.len() + 1)));
    padded.extend_from_slice(value);
    padded.push(PAD_SENTINEL);
    if padded.len() < block {
        padded.resize(block, 0);
    }
    padded
}

/// Strip the trailing zero run and the sentinel.
pub fn unpad(padded: &[u8]) -> Result<&[u8], PwkeepError> {
    let end = padded
        .iter()
        .rposition(|&b| b != 0)
        .ok_or(PwkeepError::Decryption)?;
    if padded[end] != PAD_SENTINEL {
        return Err(PwkeepError::Decryption);
    }
    Ok(&padded[..end])
}

fn aes_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, PwkeepError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| PwkeepError::Crypto("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` with AES-256-GCM under a random nonce.
///
/// Returns `(nonce, ciphertext_with_tag)`; both must be stored to decrypt.
pub fn seal(
    key: &[u8; KEY_LEN],
    aad: &[u8],
    plaintext: &[u8],
    rng: &dyn RandomSource,
) -> Result<([u8; NONCE_LEN], Vec<u8>), PwkeepError> {
    let key = aes_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(nonce, Aad::from(aad), &mut in_out)
        .map_err(|_| PwkeepError::Crypto("AES-256-GCM encryption failed".to_string()))?;

    Ok((nonce_bytes, in_out))
}

/// Decrypt and authenticate a ciphertext produced by [`seal`].
pub fn open(
    key: &[u8; KEY_LEN],
    aad: &[u8],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, PwkeepError> {
    let key = aes_key(key)?;
    let nonce = Nonce::assume_unique_for_key(*nonce);

    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext_len = key
        .open_in_place(nonce, Aad::from(aad), &mut in_out)
        .map_err(|_| PwkeepError::Decryption)?
        .len();
    in_out.truncate(plaintext_len);
    Ok(in_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use pwkeep_core::SystemRandomSource;

    const KEY: [u8; KEY_LEN] = [0x42; KEY_LEN];

    #[test]
    fn seal_open_roundtrip() {
        let rng = SystemRandomSource::new();
        let (nonce, ciphertext) = seal(&KEY, b"site", b"secret value", &rng).unwrap();
        let plaintext = open(&KEY, b"site", &nonce, &ciphertext).unwrap();

        assert_eq!(plaintext.as_slice(), b"secret value");
    }

    #[test]
    fn seal_produces_different_ciphertext_for_same_plaintext() {
        let rng = SystemRandomSource::new();
        let (nonce1, ct1) = seal(&KEY, b"site", b"same input", &rng).unwrap();
        let (nonce2, ct2) = seal(&KEY, b"site", b"same input", &rng).unwrap();

        assert_ne!(nonce1, nonce2);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn ciphertext_carries_tag() {
        let rng = SystemRandomSource::new();
        let (_, ciphertext) = seal(&KEY, b"", b"hello", &rng).unwrap();
        assert_eq!(ciphertext.len(), 5 + TAG_LEN);
    }

    #[test]
    fn open_with_wrong_key_fails() {
        let rng = SystemRandomSource::new();
        let (nonce, ciphertext) = seal(&KEY, b"site", b"secret", &rng).unwrap();
        let result = open(&[0x43; KEY_LEN], b"site", &nonce, &ciphertext);

        assert!(matches!(result, Err(PwkeepError::Decryption)));
    }

    #[test]
    fn open_with_other_associated_data_fails() {
        let rng = SystemRandomSource::new();
        let (nonce, ciphertext) = seal(&KEY, b"bank.example", b"secret", &rng).unwrap();
        let result = open(&KEY, b"mail.example", &nonce, &ciphertext);

        assert!(matches!(result, Err(PwkeepError::Decryption)));
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let rng = SystemRandomSource::new();
        let (nonce, mut ciphertext) = seal(&KEY, b"site", b"do not tamper", &rng).unwrap();
        ciphertext[0] ^= 0x01;

        assert!(matches!(
            open(&KEY, b"site", &nonce, &ciphertext),
            Err(PwkeepError::Decryption)
        ));
    }

    #[test]
    fn pad_short_value_to_block() {
        let padded = pad(b"abc", 64);
        assert_eq!(padded.len(), 64);
        assert_eq!(&padded[..4], &[b'a', b'b', b'c', PAD_SENTINEL]);
        assert!(padded[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn pad_long_value_only_appends_sentinel() {
        let value = vec![b'x'; 100];
        let padded = pad(&value, 64);
        assert_eq!(padded.len(), 101);
        assert_eq!(padded[100], PAD_SENTINEL);
    }

    #[test]
    fn pad_exact_fit_has_no_zero_run() {
        let value = vec![b'x'; 63];
        let padded = pad(&value, 64);
        assert_eq!(padded.len(), 64);
        assert_eq!(padded[63], PAD_SENTINEL);
    }

    #[test]
    fn unpad_preserves_trailing_nul_in_value() {
        let padded = pad(b"ab\0\0", 16);
        assert_eq!(unpad(&padded).unwrap(), b"ab\0\0");
    }

    #[test]
    fn unpad_rejects_missing_sentinel() {
        assert!(unpad(&[0u8; 16]).is_err());
        assert!(unpad(b"abc\0\0").is_err());
        assert!(unpad(&[]).is_err());
    }

    proptest! {
        #[test]
        fn pad_unpad_recovers_value(value in proptest::collection::vec(any::<u8>(), 0..200), block in 1usize..256) {
            let padded = pad(&value, block);
            prop_assert!(padded.len() >= block);
            prop_assert_eq!(unpad(&padded).unwrap(), value.as_slice());
        }

        #[test]
        fn short_values_share_one_length(a in "[a-z]{0,63}", b in "[a-z]{0,63}") {
            prop_assert_eq!(pad(a.as_bytes(), 64).len(), pad(b.as_bytes(), 64).len());
        }
    }
}

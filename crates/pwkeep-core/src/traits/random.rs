// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source of cryptographically secure random bytes for salts and nonces.

use ring::rand::{SecureRandom, SystemRandom};

use crate::error::PwkeepError;

/// Supplies cryptographically secure random bytes.
///
/// Implementations must be backed by a CSPRNG. Nonce reuse under AES-GCM is
/// catastrophic, so a deterministic source is only acceptable in tests.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), PwkeepError>;
}

/// The operating-system CSPRNG via `ring`.
#[derive(Debug)]
pub struct SystemRandomSource {
    rng: SystemRandom,
}

impl SystemRandomSource {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), PwkeepError> {
        self.rng
            .fill(dest)
            .map_err(|_| PwkeepError::Crypto("failed to generate random bytes".to_string()))
    }
}

// SPDX-FileCopyrightText: 2026 pwkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider traits consumed by the keychain.

pub mod random;

pub use random::{RandomSource, SystemRandomSource};

// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password hashing engine trait.
//!
//! The memory-hard production engine is constructor-injected so tests can
//! substitute a fast fake without weakening production behavior.

use crate::error::VaultError;

/// Memory-hard password hashing behind a swappable interface.
pub trait PasswordEngine: Send + Sync {
    /// Hashes `password` with a fresh random salt.
    ///
    /// Returns a self-describing encoded string (algorithm parameters and
    /// salt embedded) safe to persist.
    fn hash(&self, password: &[u8]) -> Result<String, VaultError>;

    /// Verifies `password` against an encoded hash in constant time.
    ///
    /// Mismatch returns `Ok(false)`; only a malformed `encoded` input is an
    /// error ([`VaultError::CorruptEnvelope`]).
    fn verify(&self, password: &[u8], encoded: &str) -> Result<bool, VaultError>;
}

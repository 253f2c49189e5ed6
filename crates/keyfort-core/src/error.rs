// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keyfort crypto core.
//!
//! All low-level primitive failures are caught at component boundaries and
//! re-raised as one of these kinds. No variant payload ever carries key
//! material, passphrases, or plaintext.

use thiserror::Error;

/// The primary error type used across all Keyfort components.
///
/// Ambiguity between "wrong key" and "corrupted data" is always reported as
/// [`VaultError::DecryptionFailed`] or [`VaultError::WrongCredential`]; the
/// core never returns partial plaintext.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Passphrase or other caller input is empty or malformed.
    #[error("invalid passphrase or input")]
    InvalidPassphrase,

    /// Hash verification or key unwrap mismatch. Deliberately
    /// indistinguishable from a generic authentication failure.
    #[error("incorrect credential")]
    WrongCredential,

    /// Unknown envelope version or algorithm, or malformed serialization.
    #[error("corrupt envelope: {0}")]
    CorruptEnvelope(String),

    /// No secure key store, or the operation is unsupported on this platform.
    #[error("secure hardware unavailable: {0}")]
    HardwareUnavailable(String),

    /// The hardware key was invalidated (biometric enrollment changed).
    /// Recoverable: fall back to passphrase unlock and re-run biometric setup.
    #[error("hardware key invalidated; passphrase unlock required")]
    HardwareKeyInvalidated,

    /// AEAD authentication failure. Identical for tampering and wrong key.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Store-level rekey did not complete; the old key remains authoritative.
    #[error("store key rotation failed: {0}")]
    RotationFailed(String),

    /// An operation that requires an unlocked session was called while locked.
    #[error("vault is locked")]
    VaultLocked,

    /// The vault has not been initialized on this device.
    #[error("vault is not initialized")]
    NotInitialized,

    /// Configuration errors (invalid TOML, out-of-range parameters).
    #[error("configuration error: {0}")]
    Config(String),

    /// Metadata persistence errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_no_detail_for_credential_failures() {
        // Wrong-credential and decryption failures must render identical,
        // fixed text regardless of cause.
        assert_eq!(VaultError::WrongCredential.to_string(), "incorrect credential");
        assert_eq!(VaultError::DecryptionFailed.to_string(), "decryption failed");
    }

    #[test]
    fn all_taxonomy_variants_construct() {
        let _ = VaultError::InvalidPassphrase;
        let _ = VaultError::WrongCredential;
        let _ = VaultError::CorruptEnvelope("unknown version 9".into());
        let _ = VaultError::HardwareUnavailable("no keystore".into());
        let _ = VaultError::HardwareKeyInvalidated;
        let _ = VaultError::DecryptionFailed;
        let _ = VaultError::RotationFailed("rekey interrupted".into());
        let _ = VaultError::VaultLocked;
        let _ = VaultError::NotInitialized;
        let _ = VaultError::Config("bad kdf parameters".into());
        let _ = VaultError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _ = VaultError::Internal("test".into());
    }
}

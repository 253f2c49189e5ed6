// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secure hardware provider trait for non-extractable key custody.
//!
//! Platform implementations back aliases with hardware key stores where
//! available (Secure Enclave, TPM 2.0, Android Keystore). Key bytes named by
//! an alias never cross this boundary; only sealed/opened payloads do.

use crate::error::VaultError;
use crate::types::{KeyAlias, IV_LEN};

/// Non-extractable AEAD key custody keyed by alias.
///
/// All AEAD operations use a key that cannot be exported from the platform
/// key store. Authentication failures on `open` must be reported as
/// [`VaultError::DecryptionFailed`] with no partial plaintext.
pub trait SecureHardware: Send + Sync {
    /// Creates the key named by `alias` if it does not exist yet.
    fn ensure_key(&self, alias: &KeyAlias) -> Result<(), VaultError>;

    /// Reports whether the key named by `alias` lives in secure hardware.
    fn is_hardware_backed(&self, alias: &KeyAlias) -> Result<bool, VaultError>;

    /// Encrypts `plaintext` under the aliased key with a fresh random nonce.
    ///
    /// Returns `(ciphertext_with_tag, iv)`.
    fn seal(&self, alias: &KeyAlias, plaintext: &[u8])
        -> Result<(Vec<u8>, [u8; IV_LEN]), VaultError>;

    /// Decrypts a payload sealed by [`SecureHardware::seal`].
    fn open(
        &self,
        alias: &KeyAlias,
        iv: &[u8; IV_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, VaultError>;

    /// Deletes the key named by `alias`. Deleting a missing key is not an error.
    fn delete_key(&self, alias: &KeyAlias) -> Result<(), VaultError>;

    /// Returns a stable device-bound identifier for salt binding.
    ///
    /// The identifier is not secret but must differ across devices so the
    /// same passphrase yields different master keys on different installs.
    fn device_id(&self) -> Result<Vec<u8>, VaultError>;
}

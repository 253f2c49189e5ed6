// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key wrapping under a non-extractable hardware KEK.
//!
//! Data-encryption keys are random 256-bit keys that never persist in the
//! clear: they are sealed by the platform key store under an aliased KEK and
//! stored as [`WrappedKey`] records. Hardware KEKs are AES-256-GCM.

use std::sync::Arc;

use keyfort_core::{Algorithm, KeyAlias, SecretKey, SecureHardware, VaultError, WrappedKey, IV_LEN};
use tracing::debug;
use zeroize::Zeroizing;

use crate::aead;

/// Current wrap record format version.
pub const WRAP_VERSION: u8 = 1;

/// Wraps and unwraps keys under hardware KEKs named by alias.
pub struct KeyWrapVault {
    hardware: Arc<dyn SecureHardware>,
}

impl KeyWrapVault {
    /// Creates a vault backed by the given hardware provider.
    pub fn new(hardware: Arc<dyn SecureHardware>) -> Self {
        Self { hardware }
    }

    /// Generate a fresh random 256-bit key.
    pub fn generate_key() -> Result<SecretKey, VaultError> {
        aead::generate_key()
    }

    /// Wrap `key` under the KEK named by `kek_alias`, with a fresh IV.
    pub fn wrap(&self, key: &SecretKey, kek_alias: &KeyAlias) -> Result<WrappedKey, VaultError> {
        self.hardware.ensure_key(kek_alias)?;
        let (ciphertext, iv) = self.hardware.seal(kek_alias, key.as_bytes())?;
        debug!(alias = %kek_alias, "key wrapped under hardware KEK");
        Ok(WrappedKey {
            algorithm: Algorithm::Aes256Gcm,
            iv: iv.to_vec(),
            ciphertext,
            version: WRAP_VERSION,
        })
    }

    /// Unwrap a [`WrappedKey`] back to its plaintext key.
    ///
    /// Authentication-tag mismatch (wrong KEK, corrupted record, tampering)
    /// fails with [`VaultError::DecryptionFailed`]; no partial plaintext.
    pub fn unwrap(
        &self,
        wrapped: &WrappedKey,
        kek_alias: &KeyAlias,
    ) -> Result<SecretKey, VaultError> {
        if wrapped.version == 0 || wrapped.version > WRAP_VERSION {
            return Err(VaultError::CorruptEnvelope(format!(
                "unsupported wrap record version {} (current {WRAP_VERSION})",
                wrapped.version
            )));
        }
        let iv: [u8; IV_LEN] = wrapped
            .iv
            .as_slice()
            .try_into()
            .map_err(|_| VaultError::CorruptEnvelope(format!("wrap iv must be {IV_LEN} bytes")))?;

        let plain = Zeroizing::new(self.hardware.open(kek_alias, &iv, &wrapped.ciphertext)?);
        SecretKey::from_slice(&plain).map_err(|_| VaultError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyfort_test_utils::MockSecureHardware;

    fn vault() -> KeyWrapVault {
        KeyWrapVault::new(Arc::new(MockSecureHardware::new()))
    }

    fn kek() -> KeyAlias {
        KeyAlias::from("keyfort.kek.test")
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let vault = vault();
        let key = KeyWrapVault::generate_key().unwrap();

        let wrapped = vault.wrap(&key, &kek()).unwrap();
        let unwrapped = vault.unwrap(&wrapped, &kek()).unwrap();

        assert_eq!(unwrapped, key);
    }

    #[test]
    fn wrap_uses_fresh_iv_per_call() {
        let vault = vault();
        let key = KeyWrapVault::generate_key().unwrap();

        let first = vault.wrap(&key, &kek()).unwrap();
        let second = vault.wrap(&key, &kek()).unwrap();

        assert_ne!(first.iv, second.iv);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn wrapped_record_is_versioned() {
        let vault = vault();
        let key = KeyWrapVault::generate_key().unwrap();
        let wrapped = vault.wrap(&key, &kek()).unwrap();

        assert_eq!(wrapped.version, WRAP_VERSION);
        assert_eq!(wrapped.algorithm, Algorithm::Aes256Gcm);
        assert_eq!(wrapped.iv.len(), IV_LEN);
    }

    #[test]
    fn unwrap_with_wrong_kek_fails() {
        let vault = vault();
        let key = KeyWrapVault::generate_key().unwrap();
        let wrapped = vault.wrap(&key, &kek()).unwrap();

        let other = KeyAlias::from("keyfort.kek.other");
        let result = vault.unwrap(&wrapped, &other);
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn tampered_record_fails_unwrap() {
        let vault = vault();
        let key = KeyWrapVault::generate_key().unwrap();
        let mut wrapped = vault.wrap(&key, &kek()).unwrap();
        wrapped.ciphertext[0] ^= 0x01;

        let result = vault.unwrap(&wrapped, &kek());
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn future_wrap_version_is_rejected() {
        let vault = vault();
        let key = KeyWrapVault::generate_key().unwrap();
        let mut wrapped = vault.wrap(&key, &kek()).unwrap();
        wrapped.version = WRAP_VERSION + 1;

        let result = vault.unwrap(&wrapped, &kek());
        assert!(matches!(result, Err(VaultError::CorruptEnvelope(_))));
    }

    #[test]
    fn unwrap_without_hardware_fails_closed() {
        let vault = KeyWrapVault::new(Arc::new(MockSecureHardware::unavailable()));
        let key = SecretKey::from_bytes([5u8; 32]);
        let result = vault.wrap(&key, &kek());
        assert!(matches!(result, Err(VaultError::HardwareUnavailable(_))));
    }
}

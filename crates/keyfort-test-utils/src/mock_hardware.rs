// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock secure hardware provider for deterministic testing.
//!
//! Keys live in an in-process map and AEAD runs in software (AES-256-GCM via
//! ring), but the trait contract matches a platform key store: aliased keys
//! never leave the provider, and authentication failures are
//! indistinguishable from wrong-key failures.

use std::collections::HashMap;
use std::sync::Mutex;

use keyfort_core::{KeyAlias, SecureHardware, VaultError, IV_LEN};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

/// In-memory [`SecureHardware`] implementation.
pub struct MockSecureHardware {
    keys: Mutex<HashMap<String, [u8; 32]>>,
    hardware_backed: bool,
    available: bool,
    device_id: Vec<u8>,
}

impl MockSecureHardware {
    /// A provider reporting secure-hardware backing for every key.
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            hardware_backed: true,
            available: true,
            device_id: b"mock-device-0001".to_vec(),
        }
    }

    /// A provider whose keys exist but are not hardware-backed.
    pub fn software_only() -> Self {
        Self {
            hardware_backed: false,
            ..Self::new()
        }
    }

    /// A provider where every operation fails with `HardwareUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Override the reported device identifier.
    pub fn with_device_id(mut self, device_id: &[u8]) -> Self {
        self.device_id = device_id.to_vec();
        self
    }

    /// Test helper: reports whether a key exists for `alias`.
    pub fn key_exists(&self, alias: &KeyAlias) -> bool {
        self.keys.lock().expect("mock lock poisoned").contains_key(alias.as_str())
    }

    fn check_available(&self) -> Result<(), VaultError> {
        if self.available {
            Ok(())
        } else {
            Err(VaultError::HardwareUnavailable(
                "no secure key store on this platform".to_string(),
            ))
        }
    }

    fn key_bytes(&self, alias: &KeyAlias) -> Option<[u8; 32]> {
        self.keys
            .lock()
            .expect("mock lock poisoned")
            .get(alias.as_str())
            .copied()
    }
}

impl Default for MockSecureHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureHardware for MockSecureHardware {
    fn ensure_key(&self, alias: &KeyAlias) -> Result<(), VaultError> {
        self.check_available()?;
        let mut keys = self.keys.lock().expect("mock lock poisoned");
        if !keys.contains_key(alias.as_str()) {
            let rng = SystemRandom::new();
            let mut key = [0u8; 32];
            rng.fill(&mut key)
                .map_err(|_| VaultError::Internal("mock rng failure".to_string()))?;
            keys.insert(alias.as_str().to_string(), key);
        }
        Ok(())
    }

    fn is_hardware_backed(&self, alias: &KeyAlias) -> Result<bool, VaultError> {
        self.check_available()?;
        if self.key_bytes(alias).is_none() {
            return Err(VaultError::HardwareUnavailable(format!(
                "no key for alias {alias}"
            )));
        }
        Ok(self.hardware_backed)
    }

    fn seal(
        &self,
        alias: &KeyAlias,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, [u8; IV_LEN]), VaultError> {
        self.check_available()?;
        let key_bytes = self.key_bytes(alias).ok_or_else(|| {
            VaultError::HardwareUnavailable(format!("no key for alias {alias}"))
        })?;

        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| VaultError::Internal("mock key creation failed".to_string()))?;
        let less_safe = LessSafeKey::new(unbound);

        let rng = SystemRandom::new();
        let mut nonce_bytes = [0u8; IV_LEN];
        rng.fill(&mut nonce_bytes)
            .map_err(|_| VaultError::Internal("mock rng failure".to_string()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.to_vec();
        less_safe
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::Internal("mock seal failed".to_string()))?;
        Ok((in_out, nonce_bytes))
    }

    fn open(
        &self,
        alias: &KeyAlias,
        iv: &[u8; IV_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, VaultError> {
        self.check_available()?;
        // A missing alias is indistinguishable from a wrong key: fail closed.
        let key_bytes = self.key_bytes(alias).ok_or(VaultError::DecryptionFailed)?;

        let unbound = UnboundKey::new(&AES_256_GCM, &key_bytes)
            .map_err(|_| VaultError::Internal("mock key creation failed".to_string()))?;
        let less_safe = LessSafeKey::new(unbound);
        let nonce = Nonce::assume_unique_for_key(*iv);

        let mut in_out = ciphertext.to_vec();
        let plaintext = less_safe
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::DecryptionFailed)?;
        Ok(plaintext.to_vec())
    }

    fn delete_key(&self, alias: &KeyAlias) -> Result<(), VaultError> {
        self.check_available()?;
        self.keys
            .lock()
            .expect("mock lock poisoned")
            .remove(alias.as_str());
        Ok(())
    }

    fn device_id(&self) -> Result<Vec<u8>, VaultError> {
        self.check_available()?;
        Ok(self.device_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip_through_alias() {
        let hardware = MockSecureHardware::new();
        let alias = KeyAlias::from("test.kek");
        hardware.ensure_key(&alias).unwrap();

        let (ciphertext, iv) = hardware.seal(&alias, b"wrapped key bytes").unwrap();
        let plaintext = hardware.open(&alias, &iv, &ciphertext).unwrap();
        assert_eq!(plaintext, b"wrapped key bytes");
    }

    #[test]
    fn ensure_key_is_idempotent() {
        let hardware = MockSecureHardware::new();
        let alias = KeyAlias::from("test.kek");
        hardware.ensure_key(&alias).unwrap();

        let (ciphertext, iv) = hardware.seal(&alias, b"data").unwrap();
        hardware.ensure_key(&alias).unwrap();
        // Key unchanged: old ciphertext still opens.
        assert!(hardware.open(&alias, &iv, &ciphertext).is_ok());
    }

    #[test]
    fn deleted_key_no_longer_opens() {
        let hardware = MockSecureHardware::new();
        let alias = KeyAlias::from("test.kek");
        hardware.ensure_key(&alias).unwrap();
        let (ciphertext, iv) = hardware.seal(&alias, b"data").unwrap();

        hardware.delete_key(&alias).unwrap();
        let result = hardware.open(&alias, &iv, &ciphertext);
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn unavailable_provider_fails_every_operation() {
        let hardware = MockSecureHardware::unavailable();
        let alias = KeyAlias::from("test.kek");
        assert!(hardware.ensure_key(&alias).is_err());
        assert!(hardware.device_id().is_err());
    }

    #[test]
    fn backing_report_matches_construction() {
        let alias = KeyAlias::from("test.kek");

        let hw = MockSecureHardware::new();
        hw.ensure_key(&alias).unwrap();
        assert!(hw.is_hardware_backed(&alias).unwrap());

        let sw = MockSecureHardware::software_only();
        sw.ensure_key(&alias).unwrap();
        assert!(!sw.is_hardware_backed(&alias).unwrap());
    }
}

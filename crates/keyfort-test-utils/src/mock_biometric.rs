// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted biometric gate for deterministic testing.
//!
//! Outcomes are popped from a FIFO queue. When the queue is empty, the
//! ceremony approves. Ciphers returned on approval perform real AEAD through
//! the shared mock hardware provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keyfort_core::{
    BiometricGate, Ceremony, GatedOpen, GatedSeal, KeyAlias, SecureHardware, VaultError, IV_LEN,
};

/// Scripted outcome for the next ceremony.
pub enum ScriptedOutcome {
    /// The user authenticates successfully.
    Approve,
    /// The user dismisses the prompt.
    Cancel,
    /// A biometric sample fails.
    Fail(String),
    /// The hardware key was invalidated (enrollment changed).
    Invalidated,
}

/// A mock biometric gate with a pre-configured outcome queue.
pub struct MockBiometricGate {
    hardware: Arc<dyn SecureHardware>,
    script: Mutex<VecDeque<ScriptedOutcome>>,
}

impl MockBiometricGate {
    /// Creates a gate whose ciphers run through `hardware`.
    pub fn new(hardware: Arc<dyn SecureHardware>) -> Self {
        Self {
            hardware,
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue an outcome for a future ceremony.
    pub fn push_outcome(&self, outcome: ScriptedOutcome) {
        self.script.lock().expect("mock lock poisoned").push_back(outcome);
    }

    fn next_outcome(&self) -> ScriptedOutcome {
        self.script
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or(ScriptedOutcome::Approve)
    }
}

struct MockSeal {
    hardware: Arc<dyn SecureHardware>,
    alias: KeyAlias,
}

impl GatedSeal for MockSeal {
    fn seal(self: Box<Self>, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; IV_LEN]), VaultError> {
        self.hardware.seal(&self.alias, plaintext)
    }
}

struct MockOpen {
    hardware: Arc<dyn SecureHardware>,
    alias: KeyAlias,
    iv: [u8; IV_LEN],
}

impl GatedOpen for MockOpen {
    fn open(self: Box<Self>, ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
        self.hardware.open(&self.alias, &self.iv, ciphertext)
    }
}

#[async_trait]
impl BiometricGate for MockBiometricGate {
    async fn authenticate_encrypt(
        &self,
        alias: &KeyAlias,
    ) -> Result<Ceremony<Box<dyn GatedSeal>>, VaultError> {
        match self.next_outcome() {
            ScriptedOutcome::Approve => {
                self.hardware.ensure_key(alias)?;
                Ok(Ceremony::Success(Box::new(MockSeal {
                    hardware: self.hardware.clone(),
                    alias: alias.clone(),
                })))
            }
            ScriptedOutcome::Cancel => Ok(Ceremony::Cancelled),
            ScriptedOutcome::Fail(reason) => Ok(Ceremony::Failed(reason)),
            ScriptedOutcome::Invalidated => Err(VaultError::HardwareKeyInvalidated),
        }
    }

    async fn authenticate_decrypt(
        &self,
        alias: &KeyAlias,
        iv: &[u8; IV_LEN],
    ) -> Result<Ceremony<Box<dyn GatedOpen>>, VaultError> {
        match self.next_outcome() {
            ScriptedOutcome::Approve => Ok(Ceremony::Success(Box::new(MockOpen {
                hardware: self.hardware.clone(),
                alias: alias.clone(),
                iv: *iv,
            }))),
            ScriptedOutcome::Cancel => Ok(Ceremony::Cancelled),
            ScriptedOutcome::Fail(reason) => Ok(Ceremony::Failed(reason)),
            ScriptedOutcome::Invalidated => Err(VaultError::HardwareKeyInvalidated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockSecureHardware;

    #[tokio::test]
    async fn approved_ceremony_yields_working_cipher_pair() {
        let hardware = Arc::new(MockSecureHardware::new());
        let gate = MockBiometricGate::new(hardware);
        let alias = KeyAlias::from("test.biometric");

        let seal = match gate.authenticate_encrypt(&alias).await.unwrap() {
            Ceremony::Success(cipher) => cipher,
            _ => panic!("default outcome should approve"),
        };
        let (ciphertext, iv) = seal.seal(b"master key bytes").unwrap();

        let open = match gate.authenticate_decrypt(&alias, &iv).await.unwrap() {
            Ceremony::Success(cipher) => cipher,
            _ => panic!("default outcome should approve"),
        };
        assert_eq!(open.open(&ciphertext).unwrap(), b"master key bytes");
    }

    #[tokio::test]
    async fn scripted_outcomes_pop_in_order() {
        let hardware = Arc::new(MockSecureHardware::new());
        let gate = MockBiometricGate::new(hardware);
        let alias = KeyAlias::from("test.biometric");

        gate.push_outcome(ScriptedOutcome::Cancel);
        gate.push_outcome(ScriptedOutcome::Fail("sensor error".to_string()));

        assert!(matches!(
            gate.authenticate_encrypt(&alias).await.unwrap(),
            Ceremony::Cancelled
        ));
        assert!(matches!(
            gate.authenticate_encrypt(&alias).await.unwrap(),
            Ceremony::Failed(_)
        ));
        // Queue drained: back to approving.
        assert!(matches!(
            gate.authenticate_encrypt(&alias).await.unwrap(),
            Ceremony::Success(_)
        ));
    }

    #[tokio::test]
    async fn invalidation_surfaces_as_hardware_key_invalidated() {
        let hardware = Arc::new(MockSecureHardware::new());
        let gate = MockBiometricGate::new(hardware);
        let alias = KeyAlias::from("test.biometric");

        gate.push_outcome(ScriptedOutcome::Invalidated);
        let result = gate.authenticate_decrypt(&alias, &[0u8; IV_LEN]).await;
        assert!(matches!(result, Err(VaultError::HardwareKeyInvalidated)));
    }
}

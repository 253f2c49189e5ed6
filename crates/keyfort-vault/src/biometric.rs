// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Biometric-gated unlock flow.
//!
//! State machine: `Disabled -> SettingUp -> Enabled -> (Disabled | Invalidated)`.
//!
//! Setup wraps the master key under a hardware key that is usable only after
//! a completed biometric ceremony, and persists `{ciphertext, iv}`. Unlock
//! reverses it. Invalidation of the hardware key (biometric enrollment
//! changed) disables the flow and requires passphrase fallback; it is a
//! recoverable, user-visible condition.

use std::sync::{Arc, Mutex};

use keyfort_core::{
    BiometricGate, Ceremony, KeyAlias, SecretKey, SecureHardware, VaultError, IV_LEN,
};
use keyfort_storage::{MetaStore, META_BIOMETRIC_MEK_CT, META_BIOMETRIC_MEK_IV};
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Biometric flow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricState {
    /// No biometric unlock configured.
    Disabled,
    /// A setup ceremony is in flight.
    SettingUp,
    /// A wrapped master key is persisted and the hardware key exists.
    Enabled,
    /// The hardware key was invalidated; setup must be re-run.
    Invalidated,
}

/// Terminal status of a setup ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyStatus {
    /// The ceremony completed and the flow advanced.
    Completed,
    /// The user dismissed the prompt; no key material survives the attempt.
    Cancelled,
    /// A biometric sample failed; the user may retry without re-setup.
    Failed(String),
}

/// Result of unwrapping the master key through a ceremony.
pub enum UnwrapOutcome {
    /// The recovered master key. The caller must wipe it after use.
    MasterKey(SecretKey),
    /// The user dismissed the prompt; no key material survives the attempt.
    Cancelled,
    /// A biometric sample failed; the user may retry without re-setup.
    Failed(String),
}

/// The biometric-gated unlock flow.
pub struct BiometricUnlock {
    gate: Arc<dyn BiometricGate>,
    hardware: Arc<dyn SecureHardware>,
    meta: MetaStore,
    alias: KeyAlias,
    state: Mutex<BiometricState>,
}

impl BiometricUnlock {
    /// Creates the flow in `Disabled`; call [`BiometricUnlock::refresh_state`]
    /// after construction to sync with the persisted record.
    pub fn new(
        gate: Arc<dyn BiometricGate>,
        hardware: Arc<dyn SecureHardware>,
        meta: MetaStore,
        alias: KeyAlias,
    ) -> Self {
        Self {
            gate,
            hardware,
            meta,
            alias,
            state: Mutex::new(BiometricState::Disabled),
        }
    }

    /// Current flow state.
    pub fn state(&self) -> BiometricState {
        *self.state.lock().expect("state lock poisoned")
    }

    fn set_state(&self, state: BiometricState) {
        *self.state.lock().expect("state lock poisoned") = state;
    }

    /// Re-derive the state from the persisted wrapped-MEK record.
    ///
    /// `Invalidated` is sticky until the next successful setup.
    pub async fn refresh_state(&self) -> Result<BiometricState, VaultError> {
        if self.state() == BiometricState::Invalidated {
            return Ok(BiometricState::Invalidated);
        }
        let enabled = self.meta.get(META_BIOMETRIC_MEK_CT).await?.is_some();
        let state = if enabled {
            BiometricState::Enabled
        } else {
            BiometricState::Disabled
        };
        self.set_state(state);
        Ok(state)
    }

    /// Setup: wrap `mek` under the biometric-gated hardware key and persist
    /// the record.
    ///
    /// On cancellation or a failed sample the state returns to `Disabled`
    /// and nothing is persisted. The caller owns `mek` and wipes it on every
    /// path.
    pub async fn setup(&self, mek: &SecretKey) -> Result<CeremonyStatus, VaultError> {
        self.set_state(BiometricState::SettingUp);
        self.hardware.ensure_key(&self.alias).inspect_err(|_| {
            self.set_state(BiometricState::Disabled);
        })?;

        match self.gate.authenticate_encrypt(&self.alias).await {
            Ok(Ceremony::Success(cipher)) => {
                let (ciphertext, iv) = cipher.seal(mek.as_bytes()).inspect_err(|_| {
                    self.set_state(BiometricState::Disabled);
                })?;
                self.meta
                    .put(META_BIOMETRIC_MEK_CT, ciphertext)
                    .await
                    .inspect_err(|_| self.set_state(BiometricState::Disabled))?;
                self.meta
                    .put(META_BIOMETRIC_MEK_IV, iv.to_vec())
                    .await
                    .inspect_err(|_| self.set_state(BiometricState::Disabled))?;
                self.set_state(BiometricState::Enabled);
                info!("biometric unlock enabled");
                Ok(CeremonyStatus::Completed)
            }
            Ok(Ceremony::Cancelled) => {
                self.set_state(BiometricState::Disabled);
                info!("biometric setup cancelled");
                Ok(CeremonyStatus::Cancelled)
            }
            Ok(Ceremony::Failed(reason)) => {
                self.set_state(BiometricState::Disabled);
                warn!("biometric setup failed");
                Ok(CeremonyStatus::Failed(reason))
            }
            Err(VaultError::HardwareKeyInvalidated) => {
                self.handle_invalidation().await?;
                Err(VaultError::HardwareKeyInvalidated)
            }
            Err(e) => {
                self.set_state(BiometricState::Disabled);
                Err(e)
            }
        }
    }

    /// Unlock: recover the master key through a decryption ceremony bound to
    /// the persisted record's IV.
    pub async fn unwrap_mek(&self) -> Result<UnwrapOutcome, VaultError> {
        let ciphertext = self
            .meta
            .get(META_BIOMETRIC_MEK_CT)
            .await?
            .ok_or_else(|| {
                VaultError::HardwareUnavailable("biometric unlock is not enabled".to_string())
            })?;
        let iv_bytes = self.meta.get(META_BIOMETRIC_MEK_IV).await?.ok_or_else(|| {
            VaultError::CorruptEnvelope("wrapped master key record missing iv".to_string())
        })?;
        let iv: [u8; IV_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            VaultError::CorruptEnvelope(format!("wrapped master key iv must be {IV_LEN} bytes"))
        })?;

        match self.gate.authenticate_decrypt(&self.alias, &iv).await {
            Ok(Ceremony::Success(cipher)) => {
                let plain = Zeroizing::new(cipher.open(&ciphertext)?);
                let mek =
                    SecretKey::from_slice(&plain).map_err(|_| VaultError::DecryptionFailed)?;
                Ok(UnwrapOutcome::MasterKey(mek))
            }
            Ok(Ceremony::Cancelled) => {
                info!("biometric unlock cancelled");
                Ok(UnwrapOutcome::Cancelled)
            }
            Ok(Ceremony::Failed(reason)) => {
                warn!("biometric sample failed");
                Ok(UnwrapOutcome::Failed(reason))
            }
            Err(VaultError::HardwareKeyInvalidated) => {
                self.handle_invalidation().await?;
                Err(VaultError::HardwareKeyInvalidated)
            }
            Err(e) => Err(e),
        }
    }

    /// Disable: delete the hardware key and the persisted record.
    pub async fn disable(&self) -> Result<(), VaultError> {
        self.hardware.delete_key(&self.alias)?;
        self.meta.delete(META_BIOMETRIC_MEK_CT).await?;
        self.meta.delete(META_BIOMETRIC_MEK_IV).await?;
        self.set_state(BiometricState::Disabled);
        info!("biometric unlock disabled");
        Ok(())
    }

    /// Enrollment changed: drop the stale record, mark `Invalidated`.
    async fn handle_invalidation(&self) -> Result<(), VaultError> {
        warn!("hardware key invalidated; disabling biometric unlock");
        self.hardware.delete_key(&self.alias)?;
        self.meta.delete(META_BIOMETRIC_MEK_CT).await?;
        self.meta.delete(META_BIOMETRIC_MEK_IV).await?;
        self.set_state(BiometricState::Invalidated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyfort_storage::Database;
    use keyfort_test_utils::{MockBiometricGate, MockSecureHardware, ScriptedOutcome};
    use tempfile::tempdir;

    struct Fixture {
        flow: BiometricUnlock,
        gate: Arc<MockBiometricGate>,
        hardware: Arc<MockSecureHardware>,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let meta = MetaStore::new(db.connection().clone());

        let hardware = Arc::new(MockSecureHardware::new());
        let gate = Arc::new(MockBiometricGate::new(hardware.clone()));
        let flow = BiometricUnlock::new(
            gate.clone(),
            hardware.clone(),
            meta,
            KeyAlias::from("test.biometric"),
        );
        Fixture {
            flow,
            gate,
            hardware,
            _dir: dir,
        }
    }

    fn mek() -> SecretKey {
        SecretKey::from_bytes([0x5A; 32])
    }

    #[tokio::test]
    async fn setup_then_unlock_recovers_the_master_key() {
        let fx = fixture().await;
        assert_eq!(fx.flow.state(), BiometricState::Disabled);

        let outcome = fx.flow.setup(&mek()).await.unwrap();
        assert_eq!(outcome, CeremonyStatus::Completed);
        assert_eq!(fx.flow.state(), BiometricState::Enabled);

        match fx.flow.unwrap_mek().await.unwrap() {
            UnwrapOutcome::MasterKey(recovered) => assert_eq!(recovered, mek()),
            _ => panic!("expected recovered master key"),
        }
    }

    #[tokio::test]
    async fn cancelled_setup_leaves_disabled_and_persists_nothing() {
        let fx = fixture().await;
        fx.gate.push_outcome(ScriptedOutcome::Cancel);

        let outcome = fx.flow.setup(&mek()).await.unwrap();
        assert_eq!(outcome, CeremonyStatus::Cancelled);
        assert_eq!(fx.flow.state(), BiometricState::Disabled);
        assert_eq!(fx.flow.refresh_state().await.unwrap(), BiometricState::Disabled);
    }

    #[tokio::test]
    async fn failed_sample_during_setup_is_retryable() {
        let fx = fixture().await;
        fx.gate
            .push_outcome(ScriptedOutcome::Fail("sensor error".to_string()));

        let outcome = fx.flow.setup(&mek()).await.unwrap();
        assert!(matches!(outcome, CeremonyStatus::Failed(_)));
        assert_eq!(fx.flow.state(), BiometricState::Disabled);

        // Retry without any intervening cleanup: succeeds.
        let outcome = fx.flow.setup(&mek()).await.unwrap();
        assert_eq!(outcome, CeremonyStatus::Completed);
        assert_eq!(fx.flow.state(), BiometricState::Enabled);
    }

    #[tokio::test]
    async fn failed_sample_during_unlock_is_retryable() {
        let fx = fixture().await;
        fx.flow.setup(&mek()).await.unwrap();

        fx.gate
            .push_outcome(ScriptedOutcome::Fail("sample mismatch".to_string()));
        let outcome = fx.flow.unwrap_mek().await.unwrap();
        assert!(matches!(outcome, UnwrapOutcome::Failed(_)));
        assert_eq!(fx.flow.state(), BiometricState::Enabled);

        // Immediate retry works.
        let outcome = fx.flow.unwrap_mek().await.unwrap();
        assert!(matches!(outcome, UnwrapOutcome::MasterKey(_)));
    }

    #[tokio::test]
    async fn invalidation_during_unlock_disables_the_flow() {
        let fx = fixture().await;
        fx.flow.setup(&mek()).await.unwrap();

        fx.gate.push_outcome(ScriptedOutcome::Invalidated);
        let result = fx.flow.unwrap_mek().await;
        assert!(matches!(result, Err(VaultError::HardwareKeyInvalidated)));
        assert_eq!(fx.flow.state(), BiometricState::Invalidated);

        // Record and key are gone: a further unlock reports not-enabled.
        let result = fx.flow.unwrap_mek().await;
        assert!(matches!(result, Err(VaultError::HardwareUnavailable(_))));
    }

    #[tokio::test]
    async fn setup_after_invalidation_recovers() {
        let fx = fixture().await;
        fx.flow.setup(&mek()).await.unwrap();

        fx.gate.push_outcome(ScriptedOutcome::Invalidated);
        let _ = fx.flow.unwrap_mek().await;
        assert_eq!(fx.flow.state(), BiometricState::Invalidated);

        let outcome = fx.flow.setup(&mek()).await.unwrap();
        assert!(matches!(outcome, UnwrapOutcome::MasterKey(_)));
        assert_eq!(fx.flow.state(), BiometricState::Enabled);
    }

    #[tokio::test]
    async fn disable_deletes_key_and_record() {
        let fx = fixture().await;
        fx.flow.setup(&mek()).await.unwrap();
        let alias = KeyAlias::from("test.biometric");
        assert!(fx.hardware.key_exists(&alias));

        fx.flow.disable().await.unwrap();
        assert_eq!(fx.flow.state(), BiometricState::Disabled);
        assert!(!fx.hardware.key_exists(&alias));

        let result = fx.flow.unwrap_mek().await;
        assert!(matches!(result, Err(VaultError::HardwareUnavailable(_))));
    }

    #[tokio::test]
    async fn refresh_state_follows_persisted_record() {
        let fx = fixture().await;
        assert_eq!(fx.flow.refresh_state().await.unwrap(), BiometricState::Disabled);

        fx.flow.setup(&mek()).await.unwrap();
        assert_eq!(fx.flow.refresh_state().await.unwrap(), BiometricState::Enabled);
    }

    #[tokio::test]
    async fn tampered_record_fails_closed() {
        let fx = fixture().await;
        fx.flow.setup(&mek()).await.unwrap();

        // Corrupt the persisted ciphertext.
        let mut record = fx
            .flow
            .meta
            .get(META_BIOMETRIC_MEK_CT)
            .await
            .unwrap()
            .unwrap();
        record[0] ^= 0x01;
        fx.flow.meta.put(META_BIOMETRIC_MEK_CT, record).await.unwrap();

        let result = fx.flow.unwrap_mek().await;
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
    }
}

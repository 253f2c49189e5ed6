// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The public vault facade.
//!
//! [`VaultManager`] composes the master key hierarchy, key wrapping vault,
//! encryption facade, password hashing service, biometric flow, and session
//! manager behind the operations the application layer consumes. All
//! collaborators are constructor-injected; the manager holds no ambient
//! global state.
//!
//! Memory-hard hashing and PBKDF2 derivation run under `spawn_blocking` so
//! latency-sensitive threads never stall on them.

use std::num::NonZeroU32;
use std::sync::Arc;

use keyfort_config::KeyfortConfig;
use keyfort_core::{
    BiometricGate, EncryptedStore, KeyAlias, KeyPurpose, PasswordEngine, SecretKey, SecureHardware,
    SessionState, VaultError, IV_LEN,
};
use keyfort_crypto::{
    derive_subkey, kdf, CryptoFacade, EncryptedEnvelope, KeyWrapVault, PasswordService,
};
use keyfort_storage::{
    MetaStore, META_AUTH_GATE_HASH, META_DEVICE_SALT_CT, META_DEVICE_SALT_IV, META_KDF_PARAMS,
};
use ring::digest::{digest, SHA256};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::biometric::{BiometricUnlock, CeremonyStatus, UnwrapOutcome};
use crate::session::SessionManager;

/// Alias of the KEK that wraps data-encryption keys and the device salt.
const KEK_ALIAS: &str = "keyfort.kek.v1";

/// Alias of the biometric-gated hardware key that wraps the master key.
const BIOMETRIC_ALIAS: &str = "keyfort.biometric.v1";

/// The key-management core behind the vault application layer.
pub struct VaultManager {
    config: KeyfortConfig,
    hardware: Arc<dyn SecureHardware>,
    store: Arc<dyn EncryptedStore>,
    meta: MetaStore,
    passwords: Arc<PasswordService>,
    facade: CryptoFacade,
    keywrap: KeyWrapVault,
    biometric: BiometricUnlock,
    session: SessionManager,
    kek_alias: KeyAlias,
    rotation: tokio::sync::Mutex<()>,
}

impl VaultManager {
    /// Composes the core from its collaborators.
    pub fn new(
        config: KeyfortConfig,
        hardware: Arc<dyn SecureHardware>,
        biometric_gate: Arc<dyn BiometricGate>,
        store: Arc<dyn EncryptedStore>,
        password_engine: Arc<dyn PasswordEngine>,
        meta: MetaStore,
    ) -> Self {
        let facade = CryptoFacade::new(hardware.clone());
        let keywrap = KeyWrapVault::new(hardware.clone());
        let biometric = BiometricUnlock::new(
            biometric_gate,
            hardware.clone(),
            meta.clone(),
            KeyAlias::from(BIOMETRIC_ALIAS),
        );
        let session = SessionManager::new(store.clone());

        Self {
            config,
            hardware,
            store,
            meta,
            passwords: Arc::new(PasswordService::new(password_engine)),
            facade,
            keywrap,
            biometric,
            session,
            kek_alias: KeyAlias::from(KEK_ALIAS),
            rotation: tokio::sync::Mutex::new(()),
        }
    }

    /// Whether a vault exists on this device.
    pub async fn is_initialized(&self) -> Result<bool, VaultError> {
        Ok(self.meta.get(META_AUTH_GATE_HASH).await?.is_some())
    }

    /// Current session lock state.
    pub async fn state(&self) -> SessionState {
        self.session.state().await
    }

    /// Current biometric flow state (refreshed from the persisted record).
    pub async fn biometric_state(&self) -> Result<crate::biometric::BiometricState, VaultError> {
        self.biometric.refresh_state().await
    }

    /// Create the vault: device salt, auth gate, data-encryption key, and an
    /// unlocked session.
    pub async fn initialize_vault(&self, passphrase: &SecretString) -> Result<(), VaultError> {
        if passphrase.expose_secret().is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }
        if self.is_initialized().await? {
            return Err(VaultError::Internal("vault is already initialized".to_string()));
        }

        self.hardware.ensure_key(&self.kek_alias)?;

        // Device salt: random per install, hardware-wrapped at rest.
        let install_salt = kdf::generate_install_salt()?;
        let (salt_ct, salt_iv) = self.hardware.seal(&self.kek_alias, &install_salt)?;
        self.meta.put(META_DEVICE_SALT_CT, salt_ct).await?;
        self.meta.put(META_DEVICE_SALT_IV, salt_iv.to_vec()).await?;

        // KDF parameter snapshot, so later config upgrades never lock out
        // this vault.
        let params = serde_json::json!({
            "pbkdf2_iterations": self.config.kdf.pbkdf2_iterations,
        });
        self.meta
            .put(META_KDF_PARAMS, params.to_string().into_bytes())
            .await?;

        // Authentication gate.
        let encoded = self.hash_blocking(passphrase.clone()).await?;
        self.meta
            .put(META_AUTH_GATE_HASH, encoded.into_bytes())
            .await?;

        // Master key and store key.
        let mek = self.derive_mek(passphrase).await?;
        let dek = KeyWrapVault::generate_key()?;
        let wrapped = self.keywrap.wrap(&dek, &self.kek_alias)?;
        self.meta
            .store_wrapped_key(KeyPurpose::Database, &wrapped)
            .await?;

        self.session.enter_unlocked(mek, &dek).await?;
        info!("vault initialized");
        Ok(())
    }

    /// Unlock with the passphrase.
    ///
    /// Verification failure reports [`VaultError::WrongCredential`] and
    /// leaves the session `Locked`.
    pub async fn unlock(&self, passphrase: &SecretString) -> Result<(), VaultError> {
        if passphrase.expose_secret().is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }
        let encoded = self.auth_gate_hash().await?;
        if !self.verify_blocking(passphrase.clone(), encoded).await? {
            debug!("passphrase verification failed");
            return Err(VaultError::WrongCredential);
        }

        let mek = self.derive_mek(passphrase).await?;
        let dek = self.load_dek().await?;
        self.session.enter_unlocked(mek, &dek).await
    }

    /// Lock: close the store and wipe all live key material.
    pub async fn lock(&self) -> Result<(), VaultError> {
        self.session.lock().await
    }

    /// Change the passphrase.
    ///
    /// Re-hashes the auth gate under the new passphrase. The master key is a
    /// function of the passphrase, so a persisted biometric wrap of the old
    /// key is stale and biometric unlock is disabled until re-setup. If the
    /// session is unlocked, its master key is re-derived in place.
    pub async fn change_passphrase(
        &self,
        old: &SecretString,
        new: &SecretString,
    ) -> Result<(), VaultError> {
        if new.expose_secret().is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }
        let encoded = self.auth_gate_hash().await?;
        if !self.verify_blocking(old.clone(), encoded).await? {
            return Err(VaultError::WrongCredential);
        }

        let new_hash = self.hash_blocking(new.clone()).await?;
        self.meta
            .put(META_AUTH_GATE_HASH, new_hash.into_bytes())
            .await?;

        if self.biometric.refresh_state().await? == crate::biometric::BiometricState::Enabled {
            self.biometric.disable().await?;
            info!("biometric unlock disabled after passphrase change");
        }

        if self.session.state().await == SessionState::Unlocked {
            let mek = self.derive_mek(new).await?;
            self.session.replace_master_key(mek).await?;
        }

        info!("passphrase changed");
        Ok(())
    }

    /// Enable biometric unlock: derive the master key from the passphrase
    /// and wrap it under a biometric-gated hardware key.
    pub async fn setup_biometric_unlock(
        &self,
        passphrase: &SecretString,
    ) -> Result<CeremonyStatus, VaultError> {
        let encoded = self.auth_gate_hash().await?;
        if !self.verify_blocking(passphrase.clone(), encoded).await? {
            return Err(VaultError::WrongCredential);
        }

        // The derived key lives only for this attempt; it is wiped on every
        // exit path including ceremony cancellation.
        let mek = self.derive_mek(passphrase).await?;
        self.biometric.setup(&mek).await
    }

    /// Unlock through the biometric ceremony.
    pub async fn unlock_with_biometric(&self) -> Result<CeremonyStatus, VaultError> {
        match self.biometric.unwrap_mek().await? {
            UnwrapOutcome::MasterKey(mek) => {
                let dek = self.load_dek().await?;
                self.session.enter_unlocked(mek, &dek).await?;
                Ok(CeremonyStatus::Completed)
            }
            UnwrapOutcome::Cancelled => Ok(CeremonyStatus::Cancelled),
            UnwrapOutcome::Failed(reason) => Ok(CeremonyStatus::Failed(reason)),
        }
    }

    /// Disable biometric unlock and delete its hardware key and record.
    pub async fn disable_biometric_unlock(&self) -> Result<(), VaultError> {
        self.biometric.disable().await
    }

    /// Encrypt a field under the purpose-specific subkey.
    pub async fn encrypt_field(
        &self,
        plaintext: &[u8],
        purpose: KeyPurpose,
    ) -> Result<EncryptedEnvelope, VaultError> {
        let algorithm = self.config.crypto.algorithm;
        self.session
            .with_master_key(|mek| {
                let derived = derive_subkey(mek, purpose);
                self.facade.encrypt(plaintext, algorithm, derived.key())
            })
            .await
    }

    /// Decrypt a field envelope under the purpose-specific subkey.
    pub async fn decrypt_field(
        &self,
        envelope: &EncryptedEnvelope,
        purpose: KeyPurpose,
    ) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let result = self
            .session
            .with_master_key(|mek| {
                let derived = derive_subkey(mek, purpose);
                self.facade.decrypt(envelope, derived.key())
            })
            .await;

        // Export keys are bound to this device through the master key salt,
        // so a cross-device import surfaces here. Flag it; do not change the
        // error shape.
        if purpose == KeyPurpose::Export
            && matches!(result, Err(VaultError::DecryptionFailed))
        {
            warn!("export envelope failed to decrypt; it may have been created on another device");
        }
        result
    }

    /// Hash a credential password for at-rest verification records.
    pub async fn hash_password(&self, password: &SecretString) -> Result<String, VaultError> {
        self.hash_blocking(password.clone()).await
    }

    /// Verify a credential password against an encoded hash.
    pub async fn verify_password(
        &self,
        password: &SecretString,
        encoded: &str,
    ) -> Result<bool, VaultError> {
        self.verify_blocking(password.clone(), encoded.to_string())
            .await
    }

    /// Rotate the store key: generate a new DEK, re-encrypt the store in
    /// place, and only after the store confirms the rekey overwrite the
    /// persisted wrapped-key record.
    ///
    /// On store-level failure the old wrapped key remains the sole valid key.
    /// At most one rotation is in flight at a time.
    pub async fn rotate_store_key(&self) -> Result<(), VaultError> {
        let _guard = self.rotation.lock().await;

        if self.session.state().await != SessionState::Unlocked {
            return Err(VaultError::VaultLocked);
        }

        let new_dek = KeyWrapVault::generate_key()?;
        // Wrap before the rekey so a wrap failure cannot strand a rekeyed
        // store with a stale record.
        let wrapped = self.keywrap.wrap(&new_dek, &self.kek_alias)?;

        self.store.rekey(&new_dek).await.map_err(|e| match e {
            VaultError::RotationFailed(_) => e,
            other => VaultError::RotationFailed(other.to_string()),
        })?;

        self.meta
            .store_wrapped_key(KeyPurpose::Database, &wrapped)
            .await?;
        info!("store key rotated");
        Ok(())
    }

    /// Hex-encoded SHA-256 of the device identifier, for export blobs and
    /// diagnostics. Not secret.
    pub fn device_fingerprint(&self) -> Result<String, VaultError> {
        let device_id = self.hardware.device_id()?;
        Ok(hex::encode(digest(&SHA256, &device_id)))
    }

    async fn auth_gate_hash(&self) -> Result<String, VaultError> {
        let bytes = self
            .meta
            .get(META_AUTH_GATE_HASH)
            .await?
            .ok_or(VaultError::NotInitialized)?;
        String::from_utf8(bytes)
            .map_err(|_| VaultError::CorruptEnvelope("auth gate hash is not UTF-8".to_string()))
    }

    /// Recover the bound PBKDF2 salt: unwrap the install salt and bind it to
    /// the device identifier.
    async fn load_bound_salt(&self) -> Result<[u8; 32], VaultError> {
        let ciphertext = self
            .meta
            .get(META_DEVICE_SALT_CT)
            .await?
            .ok_or(VaultError::NotInitialized)?;
        let iv_bytes = self
            .meta
            .get(META_DEVICE_SALT_IV)
            .await?
            .ok_or(VaultError::NotInitialized)?;
        let iv: [u8; IV_LEN] = iv_bytes.as_slice().try_into().map_err(|_| {
            VaultError::CorruptEnvelope(format!("device salt iv must be {IV_LEN} bytes"))
        })?;

        let install = Zeroizing::new(self.hardware.open(&self.kek_alias, &iv, &ciphertext)?);
        let install: [u8; kdf::INSTALL_SALT_LEN] = install.as_slice().try_into().map_err(|_| {
            VaultError::CorruptEnvelope("device salt record has the wrong length".to_string())
        })?;

        let device_id = self.hardware.device_id()?;
        Ok(kdf::bind_salt(&install, &device_id))
    }

    /// PBKDF2 iteration count from the persisted snapshot, falling back to
    /// the configured value for pre-snapshot vaults.
    async fn kdf_iterations(&self) -> Result<NonZeroU32, VaultError> {
        let iterations = match self.meta.get(META_KDF_PARAMS).await? {
            Some(bytes) => {
                let params: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
                    VaultError::CorruptEnvelope(format!("corrupted KDF params: {e}"))
                })?;
                u32::try_from(params["pbkdf2_iterations"].as_u64().ok_or_else(|| {
                    VaultError::CorruptEnvelope("missing pbkdf2_iterations in KDF params".to_string())
                })?)
                .map_err(|_| {
                    VaultError::CorruptEnvelope("pbkdf2_iterations out of range".to_string())
                })?
            }
            None => self.config.kdf.pbkdf2_iterations,
        };
        NonZeroU32::new(iterations)
            .ok_or_else(|| VaultError::Config("pbkdf2_iterations must be nonzero".to_string()))
    }

    /// Derive the master key off the latency-sensitive thread.
    async fn derive_mek(&self, passphrase: &SecretString) -> Result<SecretKey, VaultError> {
        let salt = self.load_bound_salt().await?;
        let iterations = self.kdf_iterations().await?;
        let passphrase = passphrase.clone();
        tokio::task::spawn_blocking(move || kdf::derive_master_key(&passphrase, &salt, iterations))
            .await
            .map_err(|e| VaultError::Internal(format!("key derivation task failed: {e}")))?
    }

    /// Load and unwrap the data-encryption key.
    async fn load_dek(&self) -> Result<SecretKey, VaultError> {
        let wrapped = self
            .meta
            .load_wrapped_key(KeyPurpose::Database)
            .await?
            .ok_or(VaultError::NotInitialized)?;
        self.keywrap.unwrap(&wrapped, &self.kek_alias)
    }

    async fn hash_blocking(&self, password: SecretString) -> Result<String, VaultError> {
        let service = self.passwords.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = Zeroizing::new(password.expose_secret().as_bytes().to_vec());
            service.hash(&bytes)
        })
        .await
        .map_err(|e| VaultError::Internal(format!("hashing task failed: {e}")))?
    }

    async fn verify_blocking(
        &self,
        password: SecretString,
        encoded: String,
    ) -> Result<bool, VaultError> {
        let service = self.passwords.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = Zeroizing::new(password.expose_secret().as_bytes().to_vec());
            service.verify(&bytes, &encoded)
        })
        .await
        .map_err(|e| VaultError::Internal(format!("verification task failed: {e}")))?
    }
}

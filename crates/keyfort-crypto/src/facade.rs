// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Algorithm-agile authenticated encryption facade.
//!
//! `Auto` resolves to AES-256-GCM when the platform key store reports
//! secure-hardware backing (hardware AES acceleration accompanies it) and to
//! ChaCha20-Poly1305 otherwise. The probe runs once per facade and the
//! result is cached for the process lifetime.

use std::sync::{Arc, OnceLock};

use keyfort_core::{Algorithm, KeyAlias, SecretKey, SecureHardware, VaultError, IV_LEN};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::aead;
use crate::envelope::{EncryptedEnvelope, ENVELOPE_VERSION};

/// Alias of the throwaway key created by the capability probe.
const PROBE_ALIAS: &str = "keyfort.capability-probe.v1";

/// Algorithm-agnostic encrypt/decrypt over versioned envelopes.
pub struct CryptoFacade {
    hardware: Arc<dyn SecureHardware>,
    resolved: OnceLock<Algorithm>,
}

impl CryptoFacade {
    /// Creates a facade backed by the given hardware provider.
    pub fn new(hardware: Arc<dyn SecureHardware>) -> Self {
        Self {
            hardware,
            resolved: OnceLock::new(),
        }
    }

    /// Resolves `Auto` to a concrete algorithm; concrete inputs pass through.
    pub fn resolve(&self, algorithm: Algorithm) -> Algorithm {
        match algorithm {
            Algorithm::Auto => *self.resolved.get_or_init(|| self.probe()),
            concrete => concrete,
        }
    }

    /// One-time hardware capability probe: create a hardware-backed test key
    /// and inspect whether the platform reports secure-hardware backing.
    fn probe(&self) -> Algorithm {
        let alias = KeyAlias::from(PROBE_ALIAS);
        let backed = self
            .hardware
            .ensure_key(&alias)
            .and_then(|()| self.hardware.is_hardware_backed(&alias));
        match backed {
            Ok(true) => {
                debug!("secure hardware detected, selecting AES-256-GCM");
                Algorithm::Aes256Gcm
            }
            Ok(false) => {
                debug!("no secure hardware backing, selecting ChaCha20-Poly1305");
                Algorithm::ChaCha20Poly1305
            }
            Err(e) => {
                warn!(error = %e, "capability probe failed, selecting ChaCha20-Poly1305");
                Algorithm::ChaCha20Poly1305
            }
        }
    }

    /// Encrypt `plaintext` under `key`, stamping the envelope with the
    /// current version and the resolved algorithm.
    ///
    /// Empty plaintext is rejected.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        algorithm: Algorithm,
        key: &SecretKey,
    ) -> Result<EncryptedEnvelope, VaultError> {
        if plaintext.is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }

        let resolved = self.resolve(algorithm);
        let (ciphertext, iv) = aead::seal(resolved, key, plaintext)?;
        Ok(EncryptedEnvelope {
            version: ENVELOPE_VERSION,
            algorithm: resolved,
            iv: iv.to_vec(),
            ciphertext,
        })
    }

    /// Decrypt an envelope, dispatching strictly on `envelope.algorithm`.
    pub fn decrypt(
        &self,
        envelope: &EncryptedEnvelope,
        key: &SecretKey,
    ) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        if envelope.version == 0 || envelope.version > ENVELOPE_VERSION {
            return Err(VaultError::CorruptEnvelope(format!(
                "unsupported envelope version {} (current {ENVELOPE_VERSION})",
                envelope.version
            )));
        }
        if envelope.algorithm == Algorithm::Auto {
            return Err(VaultError::CorruptEnvelope(
                "Auto in a stored envelope".to_string(),
            ));
        }

        let iv: [u8; IV_LEN] = envelope
            .iv
            .as_slice()
            .try_into()
            .map_err(|_| VaultError::CorruptEnvelope(format!("iv must be {IV_LEN} bytes")))?;

        aead::open(envelope.algorithm, key, &iv, &envelope.ciphertext)
    }
}

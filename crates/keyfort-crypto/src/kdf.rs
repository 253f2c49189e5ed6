// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master key derivation from a passphrase.
//!
//! PBKDF2-HMAC-SHA256 over an install-plus-device-bound salt. The iteration
//! count comes from validated configuration (600,000 minimum in production);
//! this module takes it as a parameter so tests can run with low cost.
//!
//! Derivation is CPU-intensive and must run off latency-sensitive threads
//! (callers use `tokio::task::spawn_blocking`).

use std::num::NonZeroU32;

use keyfort_core::{SecretKey, VaultError};
use ring::digest::{digest, SHA256};
use ring::pbkdf2::{derive, PBKDF2_HMAC_SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Install salt length in bytes.
pub const INSTALL_SALT_LEN: usize = 16;

/// Generate a random per-install salt.
pub fn generate_install_salt() -> Result<[u8; INSTALL_SALT_LEN], VaultError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; INSTALL_SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| VaultError::Internal("failed to generate random salt".to_string()))?;
    Ok(salt)
}

/// Bind the per-install salt to a device identifier.
///
/// The effective PBKDF2 salt is `SHA-256(install_salt || device_id)`, so the
/// same passphrase yields different master keys on different installs and
/// different devices.
pub fn bind_salt(install_salt: &[u8; INSTALL_SALT_LEN], device_id: &[u8]) -> [u8; 32] {
    let mut input = Vec::with_capacity(INSTALL_SALT_LEN + device_id.len());
    input.extend_from_slice(install_salt);
    input.extend_from_slice(device_id);

    let hash = digest(&SHA256, &input);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_ref());
    out
}

/// Derive the 256-bit master key from a passphrase and bound salt.
///
/// Deterministic: the same `(passphrase, salt, iterations)` always yields
/// bit-identical keys. An empty passphrase is rejected.
pub fn derive_master_key(
    passphrase: &SecretString,
    salt: &[u8; 32],
    iterations: NonZeroU32,
) -> Result<SecretKey, VaultError> {
    if passphrase.expose_secret().is_empty() {
        return Err(VaultError::InvalidPassphrase);
    }

    let mut output = Zeroizing::new([0u8; 32]);
    derive(
        PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        passphrase.expose_secret().as_bytes(),
        output.as_mut(),
    );

    Ok(SecretKey::from_bytes(*output))
}

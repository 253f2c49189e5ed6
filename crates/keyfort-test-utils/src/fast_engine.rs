// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fast password engine fake.
//!
//! Salted SHA-256 instead of Argon2id so tests spend no time in memory-hard
//! hashing. Matches the [`PasswordEngine`] contract exactly: self-describing
//! encoded output, fresh salt per hash, `Ok(false)` on mismatch, error only
//! on malformed input. Never use outside tests.

use keyfort_core::{PasswordEngine, VaultError};
use ring::digest::{digest, SHA256};
use ring::rand::{SecureRandom, SystemRandom};

const PREFIX: &str = "$fast-sha256$";

/// Test-only [`PasswordEngine`] implementation.
pub struct FastPasswordEngine;

fn digest_with_salt(salt: &[u8], password: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(salt.len() + password.len());
    input.extend_from_slice(salt);
    input.extend_from_slice(password);
    digest(&SHA256, &input).as_ref().to_vec()
}

impl PasswordEngine for FastPasswordEngine {
    fn hash(&self, password: &[u8]) -> Result<String, VaultError> {
        if password.is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }

        let rng = SystemRandom::new();
        let mut salt = [0u8; 16];
        rng.fill(&mut salt)
            .map_err(|_| VaultError::Internal("mock rng failure".to_string()))?;

        let hash = digest_with_salt(&salt, password);
        Ok(format!("{PREFIX}{}${}", hex::encode(salt), hex::encode(hash)))
    }

    fn verify(&self, password: &[u8], encoded: &str) -> Result<bool, VaultError> {
        let rest = encoded.strip_prefix(PREFIX).ok_or_else(|| {
            VaultError::CorruptEnvelope("malformed password hash: unknown prefix".to_string())
        })?;
        let (salt_hex, hash_hex) = rest.split_once('$').ok_or_else(|| {
            VaultError::CorruptEnvelope("malformed password hash: missing separator".to_string())
        })?;

        let salt = hex::decode(salt_hex)
            .map_err(|_| VaultError::CorruptEnvelope("malformed password hash salt".to_string()))?;
        let expected = hex::decode(hash_hex)
            .map_err(|_| VaultError::CorruptEnvelope("malformed password hash digest".to_string()))?;

        let actual = digest_with_salt(&salt, password);
        Ok(ring::constant_time::verify_slices_are_equal(&actual, &expected).is_ok())
    }
}

// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory-hard password hashing for the authentication gate.
//!
//! The production engine is Argon2id (v19) with a fresh random 128-bit salt
//! per hash and a self-describing PHC-encoded output. The engine is reached
//! through [`PasswordEngine`] so tests substitute a fast fake without
//! weakening production behavior.
//!
//! Hashing is memory- and CPU-intensive and must run off latency-sensitive
//! threads (callers use `tokio::task::spawn_blocking`).

use std::sync::Arc;

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use keyfort_core::{PasswordEngine, VaultError};
use tracing::debug;

/// Argon2id production engine.
pub struct Argon2Engine {
    memory_cost: u32,
    iterations: u32,
    parallelism: u32,
}

impl Argon2Engine {
    /// Creates an engine with explicit cost parameters.
    ///
    /// Production floors (64 MiB memory, 3 iterations, 4 lanes) are enforced
    /// by configuration validation, not here, so tests can run cheap.
    pub fn new(memory_cost: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            iterations,
            parallelism,
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>, VaultError> {
        let params = Params::new(self.memory_cost, self.iterations, self.parallelism, None)
            .map_err(|e| VaultError::Config(format!("invalid Argon2id parameters: {e}")))?;
        Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl PasswordEngine for Argon2Engine {
    fn hash(&self, password: &[u8]) -> Result<String, VaultError> {
        if password.is_empty() {
            return Err(VaultError::InvalidPassphrase);
        }

        let salt = SaltString::generate(&mut OsRng);
        let encoded = self
            .hasher()?
            .hash_password(password, &salt)
            .map_err(|e| VaultError::Internal(format!("Argon2id hashing failed: {e}")))?;
        Ok(encoded.to_string())
    }

    fn verify(&self, password: &[u8], encoded: &str) -> Result<bool, VaultError> {
        let parsed = PasswordHash::new(encoded)
            .map_err(|e| VaultError::CorruptEnvelope(format!("malformed password hash: {e}")))?;

        // Parameters come from the encoded hash, so older records verify
        // even after a config upgrade.
        match Argon2::default().verify_password(password, &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(VaultError::CorruptEnvelope(format!(
                "password hash verification failed: {e}"
            ))),
        }
    }
}

/// Password hashing service over a constructor-injected engine.
pub struct PasswordService {
    engine: Arc<dyn PasswordEngine>,
}

impl PasswordService {
    /// Creates the service with the given engine.
    pub fn new(engine: Arc<dyn PasswordEngine>) -> Self {
        Self { engine }
    }

    /// Hashes a password with a fresh random salt.
    pub fn hash(&self, password: &[u8]) -> Result<String, VaultError> {
        let encoded = self.engine.hash(password)?;
        debug!("password hashed");
        Ok(encoded)
    }

    /// Verifies a password against an encoded hash.
    pub fn verify(&self, password: &[u8], encoded: &str) -> Result<bool, VaultError> {
        self.engine.verify(password, encoded)
    }
}

// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keyfort crypto core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use keyfort_core::Algorithm;
use serde::{Deserialize, Serialize};

/// Top-level Keyfort configuration.
///
/// Loaded from TOML files with environment variable overrides. All sections
/// are optional and default to production-strength values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyfortConfig {
    /// Master key derivation settings.
    #[serde(default)]
    pub kdf: KdfConfig,

    /// Authentication-gate password hashing settings.
    #[serde(default)]
    pub password: PasswordHashConfig,

    /// Field-level encryption settings.
    #[serde(default)]
    pub crypto: CryptoConfig,

    /// Session lock policy settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// PBKDF2 master key derivation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KdfConfig {
    /// PBKDF2-HMAC-SHA256 iteration count (default: 600000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_pbkdf2_iterations(),
        }
    }
}

/// Argon2id password hashing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordHashConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_memory_cost")]
    pub memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_hash_iterations")]
    pub iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_cost: default_memory_cost(),
            iterations: default_hash_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

/// Field-level encryption configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CryptoConfig {
    /// Preferred AEAD algorithm (default: Auto, resolved by hardware probe).
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
        }
    }
}

/// Session lock policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Inactivity timeout in seconds before the vault auto-locks (default: 300).
    #[serde(default = "default_auto_lock_secs")]
    pub auto_lock_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_lock_secs: default_auto_lock_secs(),
        }
    }
}

fn default_pbkdf2_iterations() -> u32 {
    600_000
}

fn default_memory_cost() -> u32 {
    65_536
}

fn default_hash_iterations() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    4
}

fn default_algorithm() -> Algorithm {
    Algorithm::Auto
}

fn default_auto_lock_secs() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_production_strength() {
        let config = KeyfortConfig::default();
        assert_eq!(config.kdf.pbkdf2_iterations, 600_000);
        assert_eq!(config.password.memory_cost, 65_536);
        assert_eq!(config.password.iterations, 3);
        assert_eq!(config.password.parallelism, 4);
        assert_eq!(config.crypto.algorithm, Algorithm::Auto);
        assert_eq!(config.session.auto_lock_secs, 300);
    }
}

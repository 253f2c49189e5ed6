// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.
//!
//! Floors match the minimums the crypto core is specified against; a config
//! below them is a hard startup error, never a silent downgrade.

use keyfort_core::VaultError;

use crate::model::KeyfortConfig;

/// Minimum PBKDF2 iteration count for master key derivation.
pub const MIN_PBKDF2_ITERATIONS: u32 = 600_000;

/// Minimum Argon2id memory cost in KiB (64 MiB).
pub const MIN_MEMORY_COST: u32 = 65_536;

/// Minimum Argon2id iteration count.
pub const MIN_HASH_ITERATIONS: u32 = 3;

/// Validate a loaded configuration, collecting every violation.
pub fn validate_config(config: &KeyfortConfig) -> Result<(), VaultError> {
    let mut problems = Vec::new();

    if config.kdf.pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
        problems.push(format!(
            "kdf.pbkdf2_iterations = {} is below the minimum {MIN_PBKDF2_ITERATIONS}",
            config.kdf.pbkdf2_iterations
        ));
    }
    if config.password.memory_cost < MIN_MEMORY_COST {
        problems.push(format!(
            "password.memory_cost = {} KiB is below the minimum {MIN_MEMORY_COST} KiB",
            config.password.memory_cost
        ));
    }
    if config.password.iterations < MIN_HASH_ITERATIONS {
        problems.push(format!(
            "password.iterations = {} is below the minimum {MIN_HASH_ITERATIONS}",
            config.password.iterations
        ));
    }
    if config.password.parallelism == 0 {
        problems.push("password.parallelism must be at least 1".to_string());
    }
    if config.session.auto_lock_secs == 0 {
        problems.push("session.auto_lock_secs must be at least 1".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(VaultError::Config(problems.join("; ")))
    }
}

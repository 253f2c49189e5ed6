// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Keyfort crypto core.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{CryptoConfig, KdfConfig, KeyfortConfig, PasswordHashConfig, SessionConfig};
pub use validation::validate_config;

use keyfort_core::VaultError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// The high-level entry point: loads config from TOML files + env vars via
/// Figment, then runs post-deserialization validation.
pub fn load_and_validate() -> Result<KeyfortConfig, VaultError> {
    let config = loader::load_config().map_err(|e| VaultError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<KeyfortConfig, VaultError> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| VaultError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_validate_str_accepts_defaults() {
        assert!(load_and_validate_str("").is_ok());
    }

    #[test]
    fn load_and_validate_str_rejects_weak_kdf() {
        let result = load_and_validate_str("[kdf]\npbkdf2_iterations = 1000\n");
        assert!(matches!(result, Err(VaultError::Config(_))));
    }
}

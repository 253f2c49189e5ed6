// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keyfort.toml` > `~/.config/keyfort/keyfort.toml`
//! > `/etc/keyfort/keyfort.toml` with environment variable overrides via
//! `KEYFORT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeyfortConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keyfort/keyfort.toml` (system-wide)
/// 3. `~/.config/keyfort/keyfort.toml` (user XDG config)
/// 4. `./keyfort.toml` (local directory)
/// 5. `KEYFORT_*` environment variables
pub fn load_config() -> Result<KeyfortConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyfortConfig::default()))
        .merge(Toml::file("/etc/keyfort/keyfort.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keyfort/keyfort.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("keyfort.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KeyfortConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyfortConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeyfortConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyfortConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `KEYFORT_KDF_PBKDF2_ITERATIONS` must map
/// to `kdf.pbkdf2_iterations`, not `kdf.pbkdf2.iterations`.
fn env_provider() -> Env {
    Env::prefixed("KEYFORT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("kdf_", "kdf.", 1)
            .replacen("password_", "password.", 1)
            .replacen("crypto_", "crypto.", 1)
            .replacen("session_", "session.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyfort_core::Algorithm;
    use serial_test::serial;

    #[test]
    fn load_from_str_with_defaults() {
        let config = load_config_from_str("").expect("empty config should load");
        assert_eq!(config.kdf.pbkdf2_iterations, 600_000);
    }

    #[test]
    fn load_from_str_overrides_defaults() {
        let toml = r#"
            [crypto]
            algorithm = "ChaCha20Poly1305"

            [session]
            auto_lock_secs = 60
        "#;
        let config = load_config_from_str(toml).expect("config should load");
        assert_eq!(config.crypto.algorithm, Algorithm::ChaCha20Poly1305);
        assert_eq!(config.session.auto_lock_secs, 60);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r#"
            [kdf]
            pbkdf_iterations = 1000
        "#;
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    #[serial]
    fn env_var_overrides_file_value() {
        // SAFETY: test-only env mutation. Tests using env vars must not run in parallel.
        unsafe { std::env::set_var("KEYFORT_SESSION_AUTO_LOCK_SECS", "120") };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyfort.toml");
        std::fs::write(&path, "[session]\nauto_lock_secs = 900\n").unwrap();

        let config = load_config_from_path(&path).expect("config should load");
        unsafe { std::env::remove_var("KEYFORT_SESSION_AUTO_LOCK_SECS") };

        assert_eq!(config.session.auto_lock_secs, 120);
    }
}

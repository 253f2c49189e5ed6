// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keyfort credential-vault crypto core.
//!
//! This crate provides the error taxonomy, key and envelope types, the
//! zero-on-drop secret buffer, and the collaborator traits (secure hardware,
//! biometric gate, encrypted store, password engine) implemented by the
//! platform layer and by test doubles.

pub mod error;
pub mod secret;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::VaultError;
pub use secret::{SecretKey, KEY_LEN};
pub use types::{Algorithm, KeyAlias, KeyPurpose, SessionState, WrappedKey, IV_LEN, TAG_LEN};

// Re-export all collaborator traits at crate root.
pub use traits::{BiometricGate, Ceremony, EncryptedStore, GatedOpen, GatedSeal, PasswordEngine, SecureHardware};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        // Verifies that the collaborator traits compile and are accessible
        // through the public API.
        fn _assert_hardware<T: SecureHardware>() {}
        fn _assert_biometric<T: BiometricGate>() {}
        fn _assert_store<T: EncryptedStore>() {}
        fn _assert_password<T: PasswordEngine>() {}
    }

    #[test]
    fn session_state_variants() {
        assert_ne!(SessionState::Locked, SessionState::Unlocked);
    }
}

// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the crypto core.
//!
//! Implementations are constructor-injected; nothing in the core reaches for
//! an ambient global or loads an engine reflectively.

pub mod biometric;
pub mod hardware;
pub mod password;
pub mod store;

pub use biometric::{BiometricGate, Ceremony, GatedOpen, GatedSeal};
pub use hardware::SecureHardware;
pub use password::PasswordEngine;
pub use store::EncryptedStore;

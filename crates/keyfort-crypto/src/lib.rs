// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic core for the Keyfort credential vault.
//!
//! Implements the master key hierarchy (PBKDF2 master key, SP 800-108
//! subkeys), the algorithm-agile authenticated encryption facade with its
//! versioned envelope format, key wrapping under hardware KEKs, and the
//! Argon2id password hashing service.

pub mod aead;
pub mod envelope;
pub mod facade;
pub mod kdf;
pub mod keywrap;
pub mod password;
pub mod subkey;

pub use envelope::{EncryptedEnvelope, ENVELOPE_VERSION};
pub use facade::CryptoFacade;
pub use keywrap::{KeyWrapVault, WRAP_VERSION};
pub use password::{Argon2Engine, PasswordService};
pub use subkey::{derive_all_keys, derive_subkey, DerivedKey};

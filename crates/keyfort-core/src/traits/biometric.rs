// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Biometric ceremony trait.
//!
//! A ceremony is a single asynchronous, user-paced operation with three
//! terminal outcomes: success (yielding a one-shot cipher bound to the
//! hardware key), error, or user cancellation. Cancellation is an explicit
//! variant, not an error, and no retry state leaks between attempts.

use async_trait::async_trait;

use crate::error::VaultError;
use crate::types::{KeyAlias, IV_LEN};

/// Terminal outcome of one biometric ceremony.
pub enum Ceremony<C> {
    /// The user authenticated; the cipher is authorized for one operation.
    Success(C),
    /// A biometric sample failed or the sensor errored. The user may retry
    /// the ceremony without re-running setup.
    Failed(String),
    /// The user dismissed the prompt.
    Cancelled,
}

/// One-shot encryption cipher authorized by a completed ceremony.
///
/// Consuming `self` models the platform binding of an authenticated cipher
/// to a single operation.
pub trait GatedSeal: Send {
    /// Encrypts `plaintext`, returning `(ciphertext_with_tag, iv)`.
    fn seal(self: Box<Self>, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; IV_LEN]), VaultError>;
}

/// One-shot decryption cipher authorized by a completed ceremony, bound to
/// the IV of the record being opened.
pub trait GatedOpen: Send {
    /// Decrypts `ciphertext`, failing with [`VaultError::DecryptionFailed`]
    /// on authentication-tag mismatch.
    fn open(self: Box<Self>, ciphertext: &[u8]) -> Result<Vec<u8>, VaultError>;
}

/// Hardware-gated biometric authentication.
///
/// At most one ceremony is outstanding per unlock attempt. If the underlying
/// hardware key was invalidated (biometric enrollment changed), both methods
/// return [`VaultError::HardwareKeyInvalidated`] so the caller can disable
/// biometric unlock and fall back to the passphrase.
#[async_trait]
pub trait BiometricGate: Send + Sync {
    /// Runs a ceremony for an encryption-mode cipher bound to `alias`.
    async fn authenticate_encrypt(
        &self,
        alias: &KeyAlias,
    ) -> Result<Ceremony<Box<dyn GatedSeal>>, VaultError>;

    /// Runs a ceremony for a decryption-mode cipher bound to `alias` and the
    /// stored record IV.
    async fn authenticate_decrypt(
        &self,
        alias: &KeyAlias,
        iv: &[u8; IV_LEN],
    ) -> Result<Ceremony<Box<dyn GatedOpen>>, VaultError>;
}

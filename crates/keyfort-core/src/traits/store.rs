// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted store collaborator trait.

use async_trait::async_trait;

use crate::error::VaultError;
use crate::secret::SecretKey;

/// The encrypted credential store opened with raw key bytes.
///
/// The store is an external collaborator; the core only needs open/close,
/// state reporting, and an atomic in-place rekey primitive.
#[async_trait]
pub trait EncryptedStore: Send + Sync {
    /// Opens the store with the given data-encryption key.
    ///
    /// Fails with [`VaultError::DecryptionFailed`] if the key does not open
    /// the store.
    async fn open(&self, key: &SecretKey) -> Result<(), VaultError>;

    /// Closes the store, releasing its handle.
    async fn close(&self) -> Result<(), VaultError>;

    /// Reports whether the store is currently open.
    fn is_open(&self) -> bool;

    /// Atomically re-encrypts the store in place under `new_key`.
    ///
    /// All-or-nothing: on error the store remains fully readable with the
    /// previous key. The store must be open.
    async fn rekey(&self, new_key: &SecretKey) -> Result<(), VaultError>;
}

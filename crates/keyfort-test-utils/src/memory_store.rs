// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory encrypted store with rekey fault injection.
//!
//! The first `open` establishes the store key (store creation). Later opens
//! must present the same key. `fail_next_rekey` simulates a store-level
//! rekey failure for rotation-atomicity tests: the call fails and the old
//! key remains the only key that opens the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use keyfort_core::{EncryptedStore, SecretKey, VaultError};

struct Inner {
    key: Option<SecretKey>,
    open: bool,
}

/// In-memory [`EncryptedStore`] implementation.
pub struct MemoryEncryptedStore {
    inner: Mutex<Inner>,
    fail_next_rekey: AtomicBool,
}

impl MemoryEncryptedStore {
    /// Creates a store with no key established yet.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                key: None,
                open: false,
            }),
            fail_next_rekey: AtomicBool::new(false),
        }
    }

    /// Makes the next `rekey` call fail, leaving the old key authoritative.
    pub fn fail_next_rekey(&self) {
        self.fail_next_rekey.store(true, Ordering::SeqCst);
    }

    /// Test helper: reports whether `key` currently opens the store.
    pub fn key_matches(&self, key: &SecretKey) -> bool {
        self.inner
            .lock()
            .expect("mock lock poisoned")
            .key
            .as_ref()
            .is_some_and(|current| current == key)
    }
}

impl Default for MemoryEncryptedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EncryptedStore for MemoryEncryptedStore {
    async fn open(&self, key: &SecretKey) -> Result<(), VaultError> {
        let mut inner = self.inner.lock().expect("mock lock poisoned");
        match &inner.key {
            None => {
                inner.key = Some(key.clone());
                inner.open = true;
                Ok(())
            }
            Some(current) if current == key => {
                inner.open = true;
                Ok(())
            }
            Some(_) => Err(VaultError::DecryptionFailed),
        }
    }

    async fn close(&self) -> Result<(), VaultError> {
        self.inner.lock().expect("mock lock poisoned").open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.lock().expect("mock lock poisoned").open
    }

    async fn rekey(&self, new_key: &SecretKey) -> Result<(), VaultError> {
        let mut inner = self.inner.lock().expect("mock lock poisoned");
        if !inner.open {
            return Err(VaultError::RotationFailed("store is not open".to_string()));
        }
        if self.fail_next_rekey.swap(false, Ordering::SeqCst) {
            return Err(VaultError::RotationFailed(
                "simulated store rekey failure".to_string(),
            ));
        }
        inner.key = Some(new_key.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SecretKey {
        SecretKey::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn first_open_establishes_the_key() {
        let store = MemoryEncryptedStore::new();
        store.open(&key(1)).await.unwrap();
        assert!(store.is_open());

        store.close().await.unwrap();
        assert!(!store.is_open());

        // Wrong key no longer opens.
        assert!(store.open(&key(2)).await.is_err());
        // Right key does.
        store.open(&key(1)).await.unwrap();
    }

    #[tokio::test]
    async fn rekey_swaps_the_authoritative_key() {
        let store = MemoryEncryptedStore::new();
        store.open(&key(1)).await.unwrap();
        store.rekey(&key(2)).await.unwrap();

        store.close().await.unwrap();
        assert!(store.open(&key(1)).await.is_err());
        store.open(&key(2)).await.unwrap();
    }

    #[tokio::test]
    async fn failed_rekey_leaves_old_key_authoritative() {
        let store = MemoryEncryptedStore::new();
        store.open(&key(1)).await.unwrap();

        store.fail_next_rekey();
        let result = store.rekey(&key(2)).await;
        assert!(matches!(result, Err(VaultError::RotationFailed(_))));

        assert!(store.key_matches(&key(1)));
        // Failure is one-shot: the next rekey succeeds.
        store.rekey(&key(2)).await.unwrap();
        assert!(store.key_matches(&key(2)));
    }

    #[tokio::test]
    async fn rekey_requires_open_store() {
        let store = MemoryEncryptedStore::new();
        let result = store.rekey(&key(1)).await;
        assert!(matches!(result, Err(VaultError::RotationFailed(_))));
    }
}

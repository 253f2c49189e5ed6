// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session/lock state management.
//!
//! One [`SessionManager`] owns the single in-memory unlocked session: the
//! live master key and, derivatively, the open store handle. Transitions are
//! guarded by a single mutex so two concurrent unlock or lock sequences can
//! never race on the shared key material. Re-entering `Unlocked` always
//! comes with freshly derived or unwrapped keys; nothing is cached across a
//! lock boundary.

use std::sync::Arc;

use keyfort_core::{EncryptedStore, SecretKey, SessionState, VaultError};
use tracing::{debug, info};

/// Owner of the single per-process unlocked session.
pub struct SessionManager {
    store: Arc<dyn EncryptedStore>,
    master_key: tokio::sync::Mutex<Option<SecretKey>>,
}

impl SessionManager {
    /// Creates a manager in the `Locked` state.
    pub fn new(store: Arc<dyn EncryptedStore>) -> Self {
        Self {
            store,
            master_key: tokio::sync::Mutex::new(None),
        }
    }

    /// Current lock state.
    pub async fn state(&self) -> SessionState {
        if self.master_key.lock().await.is_some() {
            SessionState::Unlocked
        } else {
            SessionState::Locked
        }
    }

    /// Enter `Unlocked`: open the store with `dek` and install `mek` as the
    /// live master key.
    ///
    /// If a session was already unlocked its key material is replaced (and
    /// wiped) under the same guard; the transition never leaves two live
    /// master keys behind.
    pub async fn enter_unlocked(&self, mek: SecretKey, dek: &SecretKey) -> Result<(), VaultError> {
        let mut guard = self.master_key.lock().await;
        self.store.open(dek).await?;
        *guard = Some(mek);
        info!("session unlocked");
        Ok(())
    }

    /// Enter `Locked`: close the store handle and wipe the master key.
    ///
    /// Both happen before the guard is released, so the transition is
    /// complete by the time any other operation observes it. Locking an
    /// already-locked session is a no-op.
    pub async fn lock(&self) -> Result<(), VaultError> {
        let mut guard = self.master_key.lock().await;
        if guard.is_none() {
            debug!("lock requested while already locked");
            return Ok(());
        }
        self.store.close().await?;
        *guard = None; // zeroizes the master key on drop
        info!("session locked");
        Ok(())
    }

    /// Run `f` with the live master key, failing with
    /// [`VaultError::VaultLocked`] when there is none.
    ///
    /// The key never escapes the closure; derived material must be wiped by
    /// the closure before it returns.
    pub async fn with_master_key<T>(
        &self,
        f: impl FnOnce(&SecretKey) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let guard = self.master_key.lock().await;
        match guard.as_ref() {
            Some(mek) => f(mek),
            None => Err(VaultError::VaultLocked),
        }
    }

    /// Swap the live master key without touching the store handle.
    ///
    /// Used by passphrase changes while unlocked; the previous key is wiped.
    pub async fn replace_master_key(&self, mek: SecretKey) -> Result<(), VaultError> {
        let mut guard = self.master_key.lock().await;
        if guard.is_none() {
            return Err(VaultError::VaultLocked);
        }
        *guard = Some(mek);
        Ok(())
    }
}

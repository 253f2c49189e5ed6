// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed access to the wrapped-key table and vault metadata records.
//!
//! Records hold only hardware-wrapped or self-describing data (wrapped keys,
//! the wrapped device salt, the auth-gate hash); nothing here is secret in
//! the clear.

use keyfort_core::{Algorithm, KeyPurpose, VaultError, WrappedKey};
use rusqlite::params;
use tracing::debug;

use crate::database::storage_err;

/// Metadata record key: hardware-wrapped device salt ciphertext.
pub const META_DEVICE_SALT_CT: &str = "device_salt_ct";
/// Metadata record key: device salt wrap IV.
pub const META_DEVICE_SALT_IV: &str = "device_salt_iv";
/// Metadata record key: authentication-gate password hash (PHC string).
pub const META_AUTH_GATE_HASH: &str = "auth_gate_hash";
/// Metadata record key: biometric wrapped-MEK ciphertext.
pub const META_BIOMETRIC_MEK_CT: &str = "biometric_mek_ct";
/// Metadata record key: biometric wrapped-MEK IV.
pub const META_BIOMETRIC_MEK_IV: &str = "biometric_mek_iv";
/// Metadata record key: KDF parameter snapshot (JSON).
pub const META_KDF_PARAMS: &str = "kdf_params";

/// Typed accessor over `wrapped_keys` and `vault_meta`.
#[derive(Clone)]
pub struct MetaStore {
    conn: tokio_rusqlite::Connection,
}

impl MetaStore {
    /// Wraps an open connection.
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Insert or replace a metadata record.
    pub async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), VaultError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO vault_meta (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Read a metadata record.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, VaultError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Vec<u8>>, rusqlite::Error> {
                let result = conn.query_row(
                    "SELECT value FROM vault_meta WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(storage_err)
    }

    /// Delete a metadata record. Deleting a missing record is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), VaultError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute("DELETE FROM vault_meta WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Insert or replace the wrapped key for `purpose`.
    pub async fn store_wrapped_key(
        &self,
        purpose: KeyPurpose,
        wrapped: &WrappedKey,
    ) -> Result<(), VaultError> {
        let algorithm = wrapped.algorithm.wire_id().ok_or_else(|| {
            VaultError::CorruptEnvelope("Auto cannot be persisted in a wrap record".to_string())
        })?;
        let purpose_text = purpose.to_string();
        let iv = wrapped.iv.clone();
        let ciphertext = wrapped.ciphertext.clone();
        let version = wrapped.version;

        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO wrapped_keys \
                     (purpose, algorithm, iv, ciphertext, version) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![purpose_text, algorithm, iv, ciphertext, version],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)?;

        debug!(purpose = %purpose, "wrapped key stored");
        Ok(())
    }

    /// Load the wrapped key for `purpose`, if present.
    pub async fn load_wrapped_key(
        &self,
        purpose: KeyPurpose,
    ) -> Result<Option<WrappedKey>, VaultError> {
        let purpose = purpose.to_string();
        type Row = (u8, Vec<u8>, Vec<u8>, u8);

        let row = self
            .conn
            .call(move |conn| -> Result<Option<Row>, rusqlite::Error> {
                let result = conn.query_row(
                    "SELECT algorithm, iv, ciphertext, version \
                     FROM wrapped_keys WHERE purpose = ?1",
                    params![purpose],
                    |row| {
                        Ok((
                            row.get::<_, u8>(0)?,
                            row.get::<_, Vec<u8>>(1)?,
                            row.get::<_, Vec<u8>>(2)?,
                            row.get::<_, u8>(3)?,
                        ))
                    },
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(storage_err)?;

        match row {
            None => Ok(None),
            Some((algorithm_id, iv, ciphertext, version)) => {
                let algorithm = Algorithm::from_wire_id(algorithm_id).ok_or_else(|| {
                    VaultError::CorruptEnvelope(format!(
                        "unknown algorithm id {algorithm_id} in wrap record"
                    ))
                })?;
                Ok(Some(WrappedKey {
                    algorithm,
                    iv,
                    ciphertext,
                    version,
                }))
            }
        }
    }

    /// Delete the wrapped key for `purpose`.
    pub async fn delete_wrapped_key(&self, purpose: KeyPurpose) -> Result<(), VaultError> {
        let purpose = purpose.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "DELETE FROM wrapped_keys WHERE purpose = ?1",
                    params![purpose],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use tempfile::tempdir;

    async fn open_store() -> (MetaStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (MetaStore::new(db.connection().clone()), dir)
    }

    fn sample_wrapped() -> WrappedKey {
        WrappedKey {
            algorithm: Algorithm::Aes256Gcm,
            iv: vec![3u8; 12],
            ciphertext: vec![4u8; 48],
            version: 1,
        }
    }

    #[tokio::test]
    async fn meta_put_get_delete() {
        let (store, _dir) = open_store().await;

        assert_eq!(store.get(META_AUTH_GATE_HASH).await.unwrap(), None);

        store
            .put(META_AUTH_GATE_HASH, b"$argon2id$...".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store.get(META_AUTH_GATE_HASH).await.unwrap(),
            Some(b"$argon2id$...".to_vec())
        );

        store.delete(META_AUTH_GATE_HASH).await.unwrap();
        assert_eq!(store.get(META_AUTH_GATE_HASH).await.unwrap(), None);
    }

    #[tokio::test]
    async fn meta_put_overwrites() {
        let (store, _dir) = open_store().await;
        store.put("k", b"one".to_vec()).await.unwrap();
        store.put("k", b"two".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn wrapped_key_roundtrip() {
        let (store, _dir) = open_store().await;
        let wrapped = sample_wrapped();

        assert!(store
            .load_wrapped_key(KeyPurpose::Database)
            .await
            .unwrap()
            .is_none());

        store
            .store_wrapped_key(KeyPurpose::Database, &wrapped)
            .await
            .unwrap();
        let loaded = store
            .load_wrapped_key(KeyPurpose::Database)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, wrapped);

        store.delete_wrapped_key(KeyPurpose::Database).await.unwrap();
        assert!(store
            .load_wrapped_key(KeyPurpose::Database)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn wrapped_keys_are_keyed_by_purpose() {
        let (store, _dir) = open_store().await;
        let mut first = sample_wrapped();
        first.ciphertext = vec![1u8; 48];
        let mut second = sample_wrapped();
        second.ciphertext = vec![2u8; 48];

        store
            .store_wrapped_key(KeyPurpose::Database, &first)
            .await
            .unwrap();
        store
            .store_wrapped_key(KeyPurpose::Backup, &second)
            .await
            .unwrap();

        assert_eq!(
            store
                .load_wrapped_key(KeyPurpose::Database)
                .await
                .unwrap()
                .unwrap()
                .ciphertext,
            vec![1u8; 48]
        );
        assert_eq!(
            store
                .load_wrapped_key(KeyPurpose::Backup)
                .await
                .unwrap()
                .unwrap()
                .ciphertext,
            vec![2u8; 48]
        );
    }

    #[tokio::test]
    async fn auto_algorithm_cannot_be_stored() {
        let (store, _dir) = open_store().await;
        let mut wrapped = sample_wrapped();
        wrapped.algorithm = Algorithm::Auto;

        let result = store.store_wrapped_key(KeyPurpose::Database, &wrapped).await;
        assert!(matches!(result, Err(VaultError::CorruptEnvelope(_))));
    }

    #[tokio::test]
    async fn unknown_algorithm_id_is_corrupt() {
        let (store, _dir) = open_store().await;
        store
            .conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO wrapped_keys (purpose, algorithm, iv, ciphertext, version) \
                     VALUES ('Database', 99, x'00', x'00', 1)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let result = store.load_wrapped_key(KeyPurpose::Database).await;
        assert!(matches!(result, Err(VaultError::CorruptEnvelope(_))));
    }
}

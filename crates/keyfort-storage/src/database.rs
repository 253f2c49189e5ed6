// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use keyfort_core::VaultError;
use tracing::debug;

use crate::migrations;

/// Convert any connection/query error into the storage taxonomy kind.
pub(crate) fn storage_err(e: impl std::fmt::Display) -> VaultError {
    VaultError::Storage {
        source: e.to_string().into(),
    }
}

/// An open metadata database with migrations applied.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the metadata database at `path` and run migrations.
    pub async fn open(path: &str) -> Result<Self, VaultError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(storage_err)?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        })
        .await
        .map_err(storage_err)?;

        conn.call(|conn| -> Result<(), VaultError> { migrations::run_migrations(conn) })
            .await
            .map_err(storage_err)?;

        debug!(path = %path, "metadata database opened");
        Ok(Self { conn })
    }

    /// Returns a handle to the underlying connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Keyfort metadata.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. Holds the
//! wrapped-key table and vault metadata records (wrapped device salt,
//! auth-gate hash, biometric wrapped-MEK record); the encrypted credential
//! store itself is an external collaborator.

pub mod database;
pub mod meta;
pub mod migrations;

pub use database::Database;
pub use meta::{
    MetaStore, META_AUTH_GATE_HASH, META_BIOMETRIC_MEK_CT, META_BIOMETRIC_MEK_IV,
    META_DEVICE_SALT_CT, META_DEVICE_SALT_IV, META_KDF_PARAMS,
};

// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keyfort integration tests.
//!
//! Provides mock collaborators for fast, deterministic, CI-runnable tests
//! without platform key stores or memory-hard hashing.
//!
//! # Components
//!
//! - [`MockSecureHardware`] - In-memory aliased AEAD key store
//! - [`MockBiometricGate`] - Scripted biometric ceremonies
//! - [`MemoryEncryptedStore`] - Encrypted store with rekey fault injection
//! - [`FastPasswordEngine`] - Salted-SHA-256 stand-in for Argon2id

pub mod fast_engine;
pub mod memory_store;
pub mod mock_biometric;
pub mod mock_hardware;

pub use fast_engine::FastPasswordEngine;
pub use memory_store::MemoryEncryptedStore;
pub use mock_biometric::{MockBiometricGate, ScriptedOutcome};
pub use mock_hardware::MockSecureHardware;

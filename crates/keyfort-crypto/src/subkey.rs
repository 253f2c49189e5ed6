// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Purpose-specific subkey derivation from the master key.
//!
//! NIST SP 800-108 KDF in counter mode with HMAC-SHA256 as the PRF:
//!
//! ```text
//! subkey = HMAC(mek, counter(4B BE) || context || 0x00 || L_bits(4B BE))
//! ```
//!
//! One HMAC block yields the full 256-bit output, so the counter is fixed at
//! 1. Context strings are baked-in constants on [`KeyPurpose`]; distinct
//! purposes yield distinct key material.

use std::collections::BTreeMap;

use keyfort_core::{KeyPurpose, SecretKey};
use ring::hmac::{sign, Key, HMAC_SHA256};
use zeroize::Zeroize;

/// Output length field of the KDF input, in bits.
const OUTPUT_LEN_BITS: u32 = 256;

/// A 256-bit key derived from the master key for a single purpose.
///
/// Wipes its key material on drop. Callers holding the full purpose map from
/// [`derive_all_keys`] should drop it as soon as the keys are used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    purpose: KeyPurpose,
    key: SecretKey,
}

impl DerivedKey {
    /// The purpose this key was derived for.
    pub fn purpose(&self) -> KeyPurpose {
        self.purpose
    }

    /// The derived key material.
    pub fn key(&self) -> &SecretKey {
        &self.key
    }
}

/// Derive the subkey for one purpose. Pure and deterministic in
/// `(mek, purpose)`.
pub fn derive_subkey(mek: &SecretKey, purpose: KeyPurpose) -> DerivedKey {
    let prf_key = Key::new(HMAC_SHA256, mek.as_bytes());

    let context = purpose.context().as_bytes();
    let mut input = Vec::with_capacity(4 + context.len() + 1 + 4);
    input.extend_from_slice(&1u32.to_be_bytes());
    input.extend_from_slice(context);
    input.push(0x00);
    input.extend_from_slice(&OUTPUT_LEN_BITS.to_be_bytes());

    let tag = sign(&prf_key, &input);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(tag.as_ref());
    let key = SecretKey::from_bytes(bytes);
    bytes.zeroize();

    DerivedKey { purpose, key }
}

/// Derive the full purpose set in one call.
///
/// The returned map owns live key material; every entry wipes on drop, and
/// callers must not hold the map across a lock boundary.
pub fn derive_all_keys(mek: &SecretKey) -> BTreeMap<KeyPurpose, DerivedKey> {
    KeyPurpose::ALL
        .into_iter()
        .map(|purpose| (purpose, derive_subkey(mek, purpose)))
        .collect()
}

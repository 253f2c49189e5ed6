// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Keyfort crypto core.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// AEAD nonce length in bytes (96 bits, both supported algorithms).
pub const IV_LEN: usize = 12;

/// AEAD authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Opaque handle naming a hardware-resident key. Never exposes raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyAlias(pub String);

impl KeyAlias {
    /// Returns the alias string for passing to the platform key store.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyAlias {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The AEAD cipher used for an envelope or wrapped key.
///
/// `Auto` resolves to one of the concrete algorithms via a one-time hardware
/// capability probe and must never appear in persisted records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Algorithm {
    /// AES-256-GCM, preferred where hardware acceleration is available.
    Aes256Gcm,
    /// ChaCha20-Poly1305, software fallback.
    ChaCha20Poly1305,
    /// Resolved to a concrete algorithm before any use.
    Auto,
}

impl Algorithm {
    /// Wire identifier for persisted records. `Auto` has none.
    pub const fn wire_id(self) -> Option<u8> {
        match self {
            Self::Aes256Gcm => Some(1),
            Self::ChaCha20Poly1305 => Some(2),
            Self::Auto => None,
        }
    }

    /// Parse a wire identifier back to a concrete algorithm.
    pub const fn from_wire_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Aes256Gcm),
            2 => Some(Self::ChaCha20Poly1305),
            _ => None,
        }
    }
}

/// Purpose tag for a key derived from the master key.
///
/// Each purpose carries a fixed, unique domain-separation context string.
/// Reusing a context across purposes is a design defect, not a runtime
/// condition, so the mapping is baked in as constants.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum KeyPurpose {
    Database,
    FieldEncryption,
    Backup,
    Sync,
    Sharing,
    Export,
}

impl KeyPurpose {
    /// All purposes, in derivation order.
    pub const ALL: [Self; 6] = [
        Self::Database,
        Self::FieldEncryption,
        Self::Backup,
        Self::Sync,
        Self::Sharing,
        Self::Export,
    ];

    /// Fixed domain-separation context for this purpose.
    pub const fn context(self) -> &'static str {
        match self {
            Self::Database => "keyfort/v1/database",
            Self::FieldEncryption => "keyfort/v1/field-encryption",
            Self::Backup => "keyfort/v1/backup",
            Self::Sync => "keyfort/v1/sync",
            Self::Sharing => "keyfort/v1/sharing",
            Self::Export => "keyfort/v1/export",
        }
    }
}

/// A key encrypted under a non-extractable hardware KEK, safe to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    /// AEAD cipher used by the hardware KEK. Never `Auto`.
    pub algorithm: Algorithm,
    /// Fresh random nonce generated at wrap time.
    pub iv: Vec<u8>,
    /// Wrapped key bytes including the authentication tag.
    pub ciphertext: Vec<u8>,
    /// Wrap record format version.
    pub version: u8,
}

/// Lock state of the single per-process vault session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No key material lives in memory. Initial state.
    Locked,
    /// Exactly one live master key and one open store handle exist.
    Unlocked,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    #[test]
    fn algorithm_wire_ids_round_trip() {
        for alg in [Algorithm::Aes256Gcm, Algorithm::ChaCha20Poly1305] {
            let id = alg.wire_id().expect("concrete algorithm has a wire id");
            assert_eq!(Algorithm::from_wire_id(id), Some(alg));
        }
    }

    #[test]
    fn auto_has_no_wire_id() {
        assert_eq!(Algorithm::Auto.wire_id(), None);
    }

    #[test]
    fn unknown_wire_id_is_rejected() {
        assert_eq!(Algorithm::from_wire_id(0), None);
        assert_eq!(Algorithm::from_wire_id(9), None);
    }

    #[test]
    fn purpose_contexts_are_unique() {
        let contexts: HashSet<&str> = KeyPurpose::ALL.iter().map(|p| p.context()).collect();
        assert_eq!(contexts.len(), KeyPurpose::ALL.len());
    }

    #[test]
    fn purpose_display_round_trips() {
        for purpose in KeyPurpose::ALL {
            let s = purpose.to_string();
            assert_eq!(KeyPurpose::from_str(&s).expect("should parse back"), purpose);
        }
    }

    #[test]
    fn wrapped_key_serializes() {
        let wrapped = WrappedKey {
            algorithm: Algorithm::Aes256Gcm,
            iv: vec![0u8; IV_LEN],
            ciphertext: vec![1u8; 48],
            version: 1,
        };
        let json = serde_json::to_string(&wrapped).expect("should serialize");
        let parsed: WrappedKey = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(parsed, wrapped);
    }
}

// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zero-on-drop secret key buffer.
//!
//! Every 256-bit key in the core (master key, data-encryption keys, derived
//! subkeys) lives in a [`SecretKey`], which overwrites its bytes on drop so
//! every exit path wipes the buffer exactly once.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::VaultError;

/// Key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// A 256-bit secret key, zeroized on drop.
///
/// Equality is constant-time. Debug output never shows key bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Wraps raw key bytes. The caller's copy should be zeroized separately.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VaultError> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| VaultError::Internal(format!("key must be {KEY_LEN} bytes")))?;
        Ok(Self(arr))
    }

    /// Returns a reference to the raw key bytes.
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        ring::constant_time::verify_slices_are_equal(&self.0, &other.0).is_ok()
    }
}

impl Eq for SecretKey {}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_accepts_exactly_32_bytes() {
        assert!(SecretKey::from_slice(&[7u8; 32]).is_ok());
        assert!(SecretKey::from_slice(&[7u8; 31]).is_err());
        assert!(SecretKey::from_slice(&[7u8; 33]).is_err());
    }

    #[test]
    fn equality_matches_byte_content() {
        let a = SecretKey::from_bytes([1u8; 32]);
        let b = SecretKey::from_bytes([1u8; 32]);
        let c = SecretKey::from_bytes([2u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = SecretKey::from_bytes([0xAB; 32]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("ab"), "debug must not leak key bytes");
    }
}

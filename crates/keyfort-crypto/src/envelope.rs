// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned, self-describing ciphertext envelope.
//!
//! Wire layout for persisted envelopes:
//!
//! ```text
//! version(1B) | algorithm(1B) | ivLen(2B, big-endian) | iv(ivLen) | ciphertext(remaining)
//! ```
//!
//! The same format underlies field-level encryption and export blobs.

use keyfort_core::{Algorithm, VaultError, TAG_LEN};

/// Current envelope format version. Monotonic; decrypting an envelope with a
/// higher version is a hard error.
pub const ENVELOPE_VERSION: u8 = 1;

/// Fixed header length: version, algorithm, IV length.
const HEADER_LEN: usize = 4;

/// A self-describing ciphertext container.
///
/// `algorithm` is always a concrete cipher; `Auto` in a stored envelope is
/// an invariant violation reported as [`VaultError::CorruptEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Envelope format version.
    pub version: u8,
    /// The AEAD cipher that produced `ciphertext`.
    pub algorithm: Algorithm,
    /// Nonce used for this envelope.
    pub iv: Vec<u8>,
    /// Ciphertext including the 16-byte authentication tag.
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Serialize to the wire layout.
    ///
    /// Fails with [`VaultError::CorruptEnvelope`] if the algorithm is `Auto`
    /// or the IV length does not fit the 2-byte length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>, VaultError> {
        let algorithm_id = self.algorithm.wire_id().ok_or_else(|| {
            VaultError::CorruptEnvelope("Auto must be resolved before serialization".to_string())
        })?;
        let iv_len = u16::try_from(self.iv.len())
            .map_err(|_| VaultError::CorruptEnvelope("iv too long for wire format".to_string()))?;

        let mut out = Vec::with_capacity(HEADER_LEN + self.iv.len() + self.ciphertext.len());
        out.push(self.version);
        out.push(algorithm_id);
        out.extend_from_slice(&iv_len.to_be_bytes());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        Ok(out)
    }

    /// Parse the wire layout, rejecting unknown versions and algorithms.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VaultError> {
        if bytes.len() < HEADER_LEN {
            return Err(VaultError::CorruptEnvelope("truncated header".to_string()));
        }

        let version = bytes[0];
        if version == 0 || version > ENVELOPE_VERSION {
            return Err(VaultError::CorruptEnvelope(format!(
                "unsupported envelope version {version} (current {ENVELOPE_VERSION})"
            )));
        }

        let algorithm = Algorithm::from_wire_id(bytes[1]).ok_or_else(|| {
            VaultError::CorruptEnvelope(format!("unknown algorithm id {}", bytes[1]))
        })?;

        let iv_len = usize::from(u16::from_be_bytes([bytes[2], bytes[3]]));
        let body = &bytes[HEADER_LEN..];
        if body.len() < iv_len {
            return Err(VaultError::CorruptEnvelope("truncated iv".to_string()));
        }

        let (iv, ciphertext) = body.split_at(iv_len);
        if ciphertext.len() < TAG_LEN {
            return Err(VaultError::CorruptEnvelope(
                "ciphertext shorter than authentication tag".to_string(),
            ));
        }

        Ok(Self {
            version,
            algorithm,
            iv: iv.to_vec(),
            ciphertext: ciphertext.to_vec(),
        })
    }
}

// SPDX-FileCopyrightText: 2026 Keyfort Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AEAD seal/open operations.
//!
//! Every call to [`seal`] generates a fresh random 96-bit nonce via the
//! system CSPRNG. Nonce reuse would be catastrophic for either cipher.

use keyfort_core::{Algorithm, SecretKey, VaultError, IV_LEN};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, CHACHA20_POLY1305};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Map a resolved algorithm to its ring cipher. `Auto` is a caller bug.
fn cipher(algorithm: Algorithm) -> Result<&'static ring::aead::Algorithm, VaultError> {
    match algorithm {
        Algorithm::Aes256Gcm => Ok(&AES_256_GCM),
        Algorithm::ChaCha20Poly1305 => Ok(&CHACHA20_POLY1305),
        Algorithm::Auto => Err(VaultError::Internal(
            "Auto must be resolved to a concrete algorithm before AEAD use".to_string(),
        )),
    }
}

/// Encrypt plaintext under `key` with a random 96-bit nonce.
///
/// Returns `(ciphertext_with_tag, nonce_bytes)`. The caller must store both
/// to be able to decrypt later.
pub fn seal(
    algorithm: Algorithm,
    key: &SecretKey,
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; IV_LEN]), VaultError> {
    let unbound = UnboundKey::new(cipher(algorithm)?, key.as_bytes())
        .map_err(|_| VaultError::Internal(format!("failed to create {algorithm} key")))?;
    let less_safe = LessSafeKey::new(unbound);

    let rng = SystemRandom::new();
    let mut nonce_bytes = [0u8; IV_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| VaultError::Internal("failed to generate random nonce".to_string()))?;

    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    // Seal in place: plaintext buffer is extended with the authentication tag.
    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::Internal(format!("{algorithm} encryption failed")))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt ciphertext produced by [`seal`].
///
/// `ciphertext` must include the 16-byte authentication tag. A wrong key,
/// corrupted record, or tampering all fail identically with
/// [`VaultError::DecryptionFailed`]; no partial plaintext is returned.
pub fn open(
    algorithm: Algorithm,
    key: &SecretKey,
    nonce_bytes: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    let unbound = UnboundKey::new(cipher(algorithm)?, key.as_bytes())
        .map_err(|_| VaultError::Internal(format!("failed to create {algorithm} key")))?;
    let less_safe = LessSafeKey::new(unbound);

    let nonce = Nonce::assume_unique_for_key(*nonce_bytes);

    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let plaintext_len = less_safe
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| VaultError::DecryptionFailed)?
        .len();

    in_out.truncate(plaintext_len);
    Ok(in_out)
}

/// Generate a random 256-bit key from the system CSPRNG.
pub fn generate_key() -> Result<SecretKey, VaultError> {
    let rng = SystemRandom::new();
    let mut key = Zeroizing::new([0u8; 32]);
    rng.fill(key.as_mut())
        .map_err(|_| VaultError::Internal("failed to generate random key".to_string()))?;
    Ok(SecretKey::from_bytes(*key))
}

//! seal
//!
//! Sealed-box encryption of secret values for the remote secret store.
//!
//! # Construction
//!
//! Byte-compatible with libsodium's `crypto_box_seal`:
//!
//! 1. Reject recipient keys that are not exactly 32 bytes.
//! 2. Generate a fresh X25519 ephemeral key pair.
//! 3. `nonce = BLAKE2b-192(ephemeral_pk || recipient_pk)`; the order matters.
//! 4. `ct = crypto_box(plaintext, nonce, recipient_pk, ephemeral_sk)`
//!    (X25519 + XSalsa20-Poly1305).
//! 5. Output `base64(ephemeral_pk || ct)`.
//!
//! The ephemeral secret key lives only for the duration of one call and is
//! zeroized on drop. Nothing in here logs key material.
//!
//! # Example
//!
//! ```
//! use base64::Engine;
//! use dockhand::seal::{seal, SEAL_OVERHEAD};
//!
//! let recipient = [7u8; 32];
//! let sealed = seal(&recipient, b"hunter2").unwrap();
//! let raw = base64::engine::general_purpose::STANDARD.decode(sealed).unwrap();
//! assert_eq!(raw.len(), b"hunter2".len() + SEAL_OVERHEAD);
//!
//! assert!(seal(&[0u8; 31], b"x").is_err());
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use blake2::digest::consts::U24;
use blake2::{Blake2b, Digest};
use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::rand_core::CryptoRngCore;
use crypto_box::aead::{Aead, OsRng};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use thiserror::Error;

/// Size of an X25519 public key.
pub const KEY_SIZE: usize = 32;

/// Size of the Poly1305 authentication tag.
pub const TAG_SIZE: usize = 16;

/// Bytes added to the plaintext: ephemeral public key plus tag.
pub const SEAL_OVERHEAD: usize = KEY_SIZE + TAG_SIZE;

/// Errors from sealing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SealError {
    /// The recipient key is malformed.
    #[error("invalid recipient public key: {0}")]
    InvalidKey(String),

    /// The AEAD primitive refused to encrypt.
    #[error("encryption failed")]
    Encrypt,
}

/// Decode a base64 recipient public key, as served by the secret store.
pub fn decode_public_key(encoded: &str) -> Result<Vec<u8>, SealError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| SealError::InvalidKey(format!("not base64: {}", e)))?;
    if bytes.len() != KEY_SIZE {
        return Err(SealError::InvalidKey(format!(
            "expected {} bytes, got {}",
            KEY_SIZE,
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Seal `plaintext` for `recipient` (32 raw bytes). Returns base64.
///
/// Every call uses a fresh ephemeral key, so equal inputs give different
/// outputs.
pub fn seal(recipient: &[u8], plaintext: &[u8]) -> Result<String, SealError> {
    seal_with_rng(&mut OsRng, recipient, plaintext)
}

/// Seal with an explicit randomness source.
pub(crate) fn seal_with_rng(
    rng: &mut impl CryptoRngCore,
    recipient: &[u8],
    plaintext: &[u8],
) -> Result<String, SealError> {
    let recipient: [u8; KEY_SIZE] = recipient.try_into().map_err(|_| {
        SealError::InvalidKey(format!(
            "expected {} bytes, got {}",
            KEY_SIZE,
            recipient.len()
        ))
    })?;
    let recipient = PublicKey::from(recipient);

    let ephemeral_sk = SecretKey::generate(rng);
    let ephemeral_pk = ephemeral_sk.public_key();

    let nonce = seal_nonce(&ephemeral_pk, &recipient);
    let ciphertext = SalsaBox::new(&recipient, &ephemeral_sk)
        .encrypt(&nonce, plaintext)
        .map_err(|_| SealError::Encrypt)?;

    let mut out = Vec::with_capacity(KEY_SIZE + ciphertext.len());
    out.extend_from_slice(ephemeral_pk.as_bytes());
    out.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(out))
}

/// `BLAKE2b-192(ephemeral_pk || recipient_pk)`.
fn seal_nonce(ephemeral_pk: &PublicKey, recipient_pk: &PublicKey) -> GenericArray<u8, U24> {
    let mut hasher = Blake2b::<U24>::new();
    hasher.update(ephemeral_pk.as_bytes());
    hasher.update(recipient_pk.as_bytes());
    hasher.finalize()
}

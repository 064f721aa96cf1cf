//! Sealed-box encryption for Actions secrets.
//!
//! GitHub expects secret values sealed with libsodium's `crypto_box_seal`
//! against the repository public key: an ephemeral X25519 key pair, the
//! ephemeral public key prepended to an XSalsa20-Poly1305 ciphertext. Only
//! the public half is ever held here.
//!
//! Compiled in with the default `seal` feature. Without it
//! [`seal_secret`] always fails with `SecretError::EncryptionUnavailable`
//! and secrets are routed through the `gh` CLI instead.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::trace;

use crate::error::SecretError;

/// Whether sealed-box encryption is compiled into this build.
pub const AVAILABLE: bool = cfg!(feature = "seal");

/// Length of an X25519 public key.
pub const KEY_LEN: usize = 32;

/// Decode a base64 repository public key.
///
/// # Errors
///
/// Returns `SecretError::InvalidPublicKey` unless the key is valid base64 of exactly 32 bytes.
pub fn decode_public_key(public_key_b64: &str) -> Result<[u8; KEY_LEN], SecretError> {
    let raw = STANDARD
        .decode(public_key_b64.trim())
        .map_err(|e| SecretError::InvalidPublicKey(format!("not base64: {}", e)))?;
    raw.as_slice().try_into().map_err(|_| {
        SecretError::InvalidPublicKey(format!("expected {} bytes, got {}", KEY_LEN, raw.len()))
    })
}

/// Seal `plaintext` for the holder of `public_key_b64`, returning base64 ciphertext.
///
/// # Errors
///
/// Returns `SecretError::InvalidPublicKey` for a malformed key, or
/// `SecretError::EncryptionUnavailable` when built without the `seal` feature.
#[cfg(feature = "seal")]
pub fn seal_secret(public_key_b64: &str, plaintext: &str) -> Result<String, SecretError> {
    use crypto_box::aead::OsRng;
    use crypto_box::PublicKey;

    let key = PublicKey::from(decode_public_key(public_key_b64)?);
    let sealed = key
        .seal(&mut OsRng, plaintext.as_bytes())
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

    trace!(
        plaintext_len = plaintext.len(),
        sealed_len = sealed.len(),
        "sealed secret"
    );
    Ok(STANDARD.encode(sealed))
}

#[cfg(not(feature = "seal"))]
pub fn seal_secret(public_key_b64: &str, _plaintext: &str) -> Result<String, SecretError> {
    decode_public_key(public_key_b64)?;
    trace!("sealed-box support not compiled in");
    Err(SecretError::EncryptionUnavailable)
}

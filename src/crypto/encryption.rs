//! XSalsa20-Poly1305 sealing of key secrets
//!
//! This is the NaCl `secretbox` construction: the 16-byte Poly1305 tag is
//! prepended to the ciphertext. The nonce is supplied by the caller and
//! must never repeat under the same key.

use tracing::debug;
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::{Nonce, XSalsa20Poly1305};
use zeroize::Zeroizing;

use crate::error::{KeyFileError, KeyFileResult};

use super::key_derivation::SALT_LEN;
use super::secure_memory::SECRET_LEN;
use super::{DerivedKey, KeySecret};

/// Size of the Poly1305 authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Length of a sealed secret (secret + tag)
pub const SEALED_LEN: usize = SECRET_LEN + TAG_LEN;

/// Seal a secret under a derived key and nonce
///
/// Deterministic for identical inputs. Output is `SEALED_LEN` bytes.
pub fn seal(
    secret: &KeySecret,
    key: &DerivedKey,
    nonce: &[u8; SALT_LEN],
) -> KeyFileResult<Vec<u8>> {
    let cipher = cipher_for(key)?;

    let sealed = cipher
        .encrypt(Nonce::from_slice(nonce), secret.as_bytes().as_slice())
        .map_err(|_| KeyFileError::Encryption("secretbox seal failed".to_string()))?;

    debug!(len = sealed.len(), "sealed key secret");
    Ok(sealed)
}

/// Open a sealed secret, verifying its tag first
///
/// Any corruption of ciphertext, tag, key or nonce is an
/// [`KeyFileError::Authentication`] error; no plaintext escapes.
pub fn open(
    sealed: &[u8],
    key: &DerivedKey,
    nonce: &[u8; SALT_LEN],
) -> KeyFileResult<KeySecret> {
    let cipher = cipher_for(key)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map(Zeroizing::new)
        .map_err(|_| KeyFileError::Authentication)?;

    KeySecret::from_slice(&plaintext)
}

fn cipher_for(key: &DerivedKey) -> KeyFileResult<XSalsa20Poly1305> {
    XSalsa20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| KeyFileError::Encryption(format!("Failed to create cipher: {}", e)))
}

//! Key derivation using scrypt
//!
//! Derives the 32-byte sealing key from a passphrase and a 24-byte salt.
//! The cost parameters are part of the on-disk format: changing them makes
//! every existing encrypted key file unreadable.

use rand::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{KeyFileError, KeyFileResult};

/// Salt length in bytes (also the secretbox nonce length)
pub const SALT_LEN: usize = 24;

/// Derived key length in bytes
pub const DERIVED_KEY_LEN: usize = 32;

/// scrypt work factor as log2(N); N = 16384
pub const SCRYPT_LOG_N: u8 = 14;

/// scrypt block size
pub const SCRYPT_R: u32 = 8;

/// scrypt parallelism
pub const SCRYPT_P: u32 = 1;

/// A derived encryption key
pub struct DerivedKey {
    key: Zeroizing<[u8; DERIVED_KEY_LEN]>,
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive a sealing key from a passphrase and salt
///
/// Deterministic for a given (passphrase, salt). Deliberately slow.
pub fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> KeyFileResult<DerivedKey> {
    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, DERIVED_KEY_LEN)
        .map_err(|e| KeyFileError::Derivation(format!("Invalid scrypt parameters: {}", e)))?;

    let mut key = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    scrypt::scrypt(passphrase, salt, &params, &mut key[..])
        .map_err(|e| KeyFileError::Derivation(format!("scrypt failed: {}", e)))?;

    debug!("derived sealing key");
    Ok(DerivedKey { key })
}

/// Generate a random salt for key derivation
pub fn generate_salt<R: RngCore + CryptoRng>(rng: &mut R) -> KeyFileResult<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    rng.try_fill_bytes(&mut salt)?;
    Ok(salt)
}

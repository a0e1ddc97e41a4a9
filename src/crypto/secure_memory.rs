//! Secure memory handling for sensitive data
//!
//! Provides the fixed-size key secret and the passphrase type. Both wipe
//! their contents on drop so key material does not linger in memory.

use std::fmt;

use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{KeyFileError, KeyFileResult};

/// Length of a stored secret in bytes
pub const SECRET_LEN: usize = 96;

/// Length of each sub-key packed into a secret
pub const SUB_KEY_LEN: usize = 32;

/// A 96-byte secret: three 32-byte sub-keys concatenated
///
/// Always fully populated. Zeroed when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeySecret {
    bytes: [u8; SECRET_LEN],
}

impl KeySecret {
    /// Wrap an existing 96-byte array
    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self { bytes }
    }

    /// Copy a secret out of a slice, which must be exactly 96 bytes long
    pub fn from_slice(bytes: &[u8]) -> KeyFileResult<Self> {
        if bytes.len() != SECRET_LEN {
            return Err(KeyFileError::InvalidSecret(bytes.len()));
        }
        let mut secret = Self {
            bytes: [0u8; SECRET_LEN],
        };
        secret.bytes.copy_from_slice(bytes);
        Ok(secret)
    }

    /// Generate a fresh secret from a cryptographically secure source
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> KeyFileResult<Self> {
        let mut secret = Self {
            bytes: [0u8; SECRET_LEN],
        };
        rng.try_fill_bytes(&mut secret.bytes)?;
        Ok(secret)
    }

    /// Get the raw secret bytes
    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.bytes
    }

    /// Iterate over the three 32-byte sub-keys
    pub fn sub_keys(&self) -> impl Iterator<Item = &[u8]> {
        self.bytes.chunks_exact(SUB_KEY_LEN)
    }
}

// Don't print the contents in Debug output
impl fmt::Debug for KeySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySecret")
            .field("len", &SECRET_LEN)
            .finish()
    }
}

/// A passphrase that zeros its contents on drop
///
/// An empty passphrase is a real value: it selects the unencrypted
/// storage format.
pub struct Passphrase {
    inner: Zeroizing<Vec<u8>>,
}

impl Passphrase {
    /// Create a new Passphrase
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: Zeroizing::new(bytes.into()),
        }
    }

    /// The empty passphrase (unencrypted storage)
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Get the passphrase bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Get the length
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for Passphrase {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&str> for Passphrase {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<Vec<u8>> for Passphrase {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Passphrase {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Passphrase")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl fmt::Display for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.inner.len())
    }
}

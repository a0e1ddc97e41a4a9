//! On-disk key envelope
//!
//! A key file holds one line of hex. The decoded length picks the format:
//!
//! - 96 bytes: the raw secret, unencrypted
//! - 136 bytes: `salt(24) || secretbox(secret)(112)`, where the salt doubles
//!   as the secretbox nonce
//!
//! Anything else is rejected.

use std::fmt;
use std::path::Path;

use rand::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, KeySecret, Passphrase, SALT_LEN, SEALED_LEN, SECRET_LEN};
use crate::error::{KeyFileError, KeyFileResult};

/// Decoded length of an unencrypted envelope
pub const PLAINTEXT_LEN: usize = SECRET_LEN;

/// Decoded length of an encrypted envelope
pub const ENCRYPTED_LEN: usize = SALT_LEN + SEALED_LEN;

/// Hex length of an unencrypted envelope, without the trailing newline
pub const PLAINTEXT_HEX_LEN: usize = PLAINTEXT_LEN * 2;

/// Hex length of an encrypted envelope, without the trailing newline
pub const ENCRYPTED_HEX_LEN: usize = ENCRYPTED_LEN * 2;

/// Which variant a key file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeFormat {
    /// Raw secret, readable by anyone who can read the file
    Plaintext,
    /// Secret sealed under a passphrase-derived key
    Encrypted,
}

impl EnvelopeFormat {
    /// Classify a decoded byte length
    pub fn from_decoded_len(len: usize) -> Option<Self> {
        match len {
            PLAINTEXT_LEN => Some(Self::Plaintext),
            ENCRYPTED_LEN => Some(Self::Encrypted),
            _ => None,
        }
    }

    /// Check if this format needs a passphrase to open
    pub fn is_encrypted(self) -> bool {
        matches!(self, Self::Encrypted)
    }
}

impl fmt::Display for EnvelopeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext => write!(f, "unencrypted"),
            Self::Encrypted => write!(f, "encrypted"),
        }
    }
}

/// A key secret in its stored form
#[derive(Debug, Clone)]
pub enum Envelope {
    /// The secret itself
    Plaintext(KeySecret),
    /// A sealed secret and the salt/nonce it was sealed with
    Encrypted {
        salt: [u8; SALT_LEN],
        sealed: Vec<u8>,
    },
}

impl Envelope {
    /// Wrap a secret for storage
    ///
    /// An empty passphrase yields the plaintext form. Otherwise a fresh salt
    /// is drawn from `rng`, so two calls never produce the same envelope.
    pub fn seal<R: RngCore + CryptoRng>(
        secret: &KeySecret,
        passphrase: &Passphrase,
        rng: &mut R,
    ) -> KeyFileResult<Self> {
        if passphrase.is_empty() {
            return Ok(Self::Plaintext(secret.clone()));
        }

        let salt = crypto::generate_salt(rng)?;
        let key = crypto::derive_key(passphrase.as_bytes(), &salt)?;
        let sealed = crypto::seal(secret, &key, &salt)?;

        Ok(Self::Encrypted { salt, sealed })
    }

    /// Recover the secret
    ///
    /// The passphrase is ignored for plaintext envelopes. For encrypted ones
    /// an empty passphrase is not special: it is derived like any other and
    /// fails authentication unless it is the right one.
    pub fn open(&self, passphrase: &Passphrase) -> KeyFileResult<KeySecret> {
        match self {
            Self::Plaintext(secret) => Ok(secret.clone()),
            Self::Encrypted { salt, sealed } => {
                let key = crypto::derive_key(passphrase.as_bytes(), salt)?;
                crypto::open(sealed, &key, salt)
            }
        }
    }

    /// Which variant this is
    pub fn format(&self) -> EnvelopeFormat {
        match self {
            Self::Plaintext(_) => EnvelopeFormat::Plaintext,
            Self::Encrypted { .. } => EnvelopeFormat::Encrypted,
        }
    }

    /// Parse key file contents. `source` names the file in errors.
    pub fn decode(contents: &[u8], source: &Path) -> KeyFileResult<Self> {
        let raw = decode_hex(contents, source)?;

        match EnvelopeFormat::from_decoded_len(raw.len()) {
            Some(EnvelopeFormat::Plaintext) => Ok(Self::Plaintext(KeySecret::from_slice(&raw)?)),
            Some(EnvelopeFormat::Encrypted) => {
                let (salt_bytes, sealed) = raw.split_at(SALT_LEN);
                let mut salt = [0u8; SALT_LEN];
                salt.copy_from_slice(salt_bytes);
                debug!(path = %source.display(), "found encrypted key envelope");
                Ok(Self::Encrypted {
                    salt,
                    sealed: sealed.to_vec(),
                })
            }
            None => Err(KeyFileError::format(
                source,
                format!(
                    "key length error: decoded {} bytes, expected {} or {}",
                    raw.len(),
                    PLAINTEXT_LEN,
                    ENCRYPTED_LEN
                ),
            )),
        }
    }

    /// Render as key file contents: one line of lowercase hex
    pub fn encode(&self) -> KeyFileResult<Zeroizing<Vec<u8>>> {
        match self {
            Self::Plaintext(secret) => hex_line(secret.as_bytes()),
            Self::Encrypted { salt, sealed } => {
                let mut raw = Vec::with_capacity(ENCRYPTED_LEN);
                raw.extend_from_slice(salt);
                raw.extend_from_slice(sealed);
                hex_line(&raw)
            }
        }
    }
}

/// Detect the format of key file contents without opening them
pub fn detect_format(contents: &[u8], source: &Path) -> KeyFileResult<EnvelopeFormat> {
    let raw = decode_hex(contents, source)?;
    EnvelopeFormat::from_decoded_len(raw.len()).ok_or_else(|| {
        KeyFileError::format(
            source,
            format!("key length error: decoded {} bytes", raw.len()),
        )
    })
}

// Sized up front so the hex text never reallocates and leaves a copy behind
fn hex_line(raw: &[u8]) -> KeyFileResult<Zeroizing<Vec<u8>>> {
    let hex_len = raw.len() * 2;
    let mut line = Zeroizing::new(vec![0u8; hex_len + 1]);
    hex::encode_to_slice(raw, &mut line[..hex_len])
        .map_err(|e| KeyFileError::Encryption(format!("hex encoding failed: {}", e)))?;
    line[hex_len] = b'\n';
    Ok(line)
}

fn decode_hex(contents: &[u8], source: &Path) -> KeyFileResult<Zeroizing<Vec<u8>>> {
    let text = std::str::from_utf8(contents)
        .map_err(|_| KeyFileError::format(source, "key file is not text"))?;

    hex::decode(text.trim())
        .map(Zeroizing::new)
        .map_err(|e| KeyFileError::format(source, format!("invalid hex: {}", e)))
}

//! Custom error types for keyfile
//!
//! This module defines the error hierarchy for key file operations using
//! thiserror for ergonomic error definitions.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The main error type for keyfile operations
#[derive(Error, Debug)]
pub enum KeyFileError {
    /// File I/O errors (missing, unreadable or unwritable key file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key file does not hold a recognizable envelope
    #[error("Key format error for {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// The key-derivation primitive rejected its parameters
    #[error("Key derivation error: {0}")]
    Derivation(String),

    /// The sealing primitive refused its input
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Integrity verification failed while opening a sealed key.
    ///
    /// Deliberately carries no detail: a wrong passphrase and a corrupted
    /// file look the same from outside.
    #[error("Decryption failed: wrong passphrase or corrupted key data")]
    Authentication,

    /// A secret was built from the wrong number of bytes
    #[error("Invalid secret length: expected 96 bytes, got {0}")]
    InvalidSecret(usize),

    /// The secure random source failed
    #[error("Random source error: {0}")]
    Random(String),

    /// Reading a passphrase failed
    #[error("Passphrase input error: {0}")]
    Prompt(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl KeyFileError {
    /// Create a format error naming the offending file
    pub fn format(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Check if this is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    /// Check if this is a format error
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Check if this is an I/O "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl From<serde_json::Error> for KeyFileError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<rand::Error> for KeyFileError {
    fn from(err: rand::Error) -> Self {
        Self::Random(err.to_string())
    }
}

/// Result type alias for keyfile operations
pub type KeyFileResult<T> = Result<T, KeyFileError>;

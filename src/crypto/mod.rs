//! Cryptographic functions for keyfile
//!
//! Provides XSalsa20-Poly1305 sealing with scrypt key derivation for
//! optional at-rest protection of key secrets.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{open, seal, SEALED_LEN, TAG_LEN};
pub use key_derivation::{derive_key, generate_salt, DerivedKey, SALT_LEN};
pub use secure_memory::{KeySecret, Passphrase, SECRET_LEN};

//! keyfile - passphrase-protected storage for 96-byte secret keys
//!
//! A key file is a single line of hex. With an empty passphrase it holds the
//! raw secret; otherwise it holds a 24-byte salt followed by the secret
//! sealed with XSalsa20-Poly1305 under a scrypt-derived key. The salt doubles
//! as the nonce and is fresh on every save.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `crypto`: Key derivation, sealing and zeroizing secret types
//! - `envelope`: The on-disk format and its detection
//! - `events`: Diagnostics reported to an observer instead of printed
//! - `prompt`: Passphrase sources and the confirmation loop
//! - `storage`: Owner-only atomic file writes
//! - `services`: The key file service
//! - `cli`: Command handlers for the `keyfile` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use keyfile::events::TracingObserver;
//! use keyfile::prompt::TerminalPrompt;
//! use keyfile::services::KeyFileService;
//!
//! let observer = TracingObserver;
//! let service = KeyFileService::new(&observer);
//! let secret = service.read_or_create(path, &mut TerminalPrompt::new())?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod events;
pub mod prompt;
pub mod services;
pub mod storage;

pub use crypto::{KeySecret, Passphrase};
pub use envelope::{Envelope, EnvelopeFormat};
pub use error::{KeyFileError, KeyFileResult};
pub use services::{KeyFileService, KeyFileStatus};

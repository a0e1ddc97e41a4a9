//! Service layer for keyfile
//!
//! Business logic on top of the envelope format and storage.

pub mod keyfile;

pub use keyfile::{KeyFileService, KeyFileStatus};

//! User settings for keyfile
//!
//! Stored as JSON in the base directory. Every field has a default, so a
//! missing or partial file is fine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::KeyFilePaths;
use crate::error::KeyFileError;
use crate::storage::{read_json, write_json_atomic};

/// User settings for keyfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// File name of the default key file, inside the base directory
    #[serde(default = "default_key_file_name")]
    pub key_file_name: String,

    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether an empty passphrase may store a key unencrypted
    #[serde(default = "default_allow_unencrypted")]
    pub allow_unencrypted: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_key_file_name() -> String {
    "privkey.hex".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_allow_unencrypted() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            key_file_name: default_key_file_name(),
            log_level: default_log_level(),
            allow_unencrypted: default_allow_unencrypted(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    ///
    /// Defaults are not written back; the caller decides when to persist.
    pub fn load_or_create(paths: &KeyFilePaths) -> Result<Self, KeyFileError> {
        read_json(paths.settings_file())
    }

    /// Save settings to disk
    pub fn save(&self, paths: &KeyFilePaths) -> Result<(), KeyFileError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// The key file used when none is given on the command line
    pub fn default_key_file(&self, paths: &KeyFilePaths) -> PathBuf {
        paths.key_file(&self.key_file_name)
    }
}

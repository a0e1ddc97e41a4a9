//! Path management for keyfile
//!
//! ## Path Resolution Order
//!
//! 1. `KEYFILE_HOME` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/keyfile` or `~/.config/keyfile`
//! 3. Windows: `%APPDATA%\keyfile`

use std::path::{Path, PathBuf};

use crate::error::KeyFileError;

/// Environment variable overriding the base directory
pub const HOME_ENV_VAR: &str = "KEYFILE_HOME";

/// Manages all paths used by keyfile
#[derive(Debug, Clone)]
pub struct KeyFilePaths {
    /// Base directory for settings and the default key file
    base_dir: PathBuf,
}

impl KeyFilePaths {
    /// Create a new KeyFilePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, KeyFileError> {
        let base_dir = if let Ok(custom) = std::env::var(HOME_ENV_VAR) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create KeyFilePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/keyfile/ or equivalent)
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path of a key file kept in the base directory
    pub fn key_file(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), KeyFileError> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

/// Resolve the default base directory based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, KeyFileError> {
    // Unix (Linux/macOS): Use XDG_CONFIG_HOME if set, otherwise ~/.config
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg),
        Err(_) => {
            let home = std::env::var("HOME").map_err(|_| {
                KeyFileError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("keyfile"))
}

/// Resolve the default base directory based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, KeyFileError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| KeyFileError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("keyfile"))
}

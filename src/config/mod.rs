//! Configuration module for keyfile
//!
//! Base directory resolution and persisted user settings.

pub mod paths;
pub mod settings;

pub use paths::KeyFilePaths;
pub use settings::Settings;

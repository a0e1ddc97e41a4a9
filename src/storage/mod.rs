//! Storage layer for keyfile
//!
//! Raw key file reads and owner-only atomic writes, plus the JSON helpers
//! used for settings.

pub mod file_io;

pub use file_io::{
    key_file_size, read_json, read_key_file, write_json_atomic, write_key_file, KEY_FILE_MODE,
};

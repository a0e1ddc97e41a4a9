//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod key;
pub mod observer;

pub use key::{handle_key_command, KeyCommands, KeyFileArgs};
pub use observer::ConsoleObserver;

//! Terminal output for key file events

use crate::events::{KeyFileEvent, KeyFileObserver};

/// Prints key file events for a human at the terminal
///
/// Warnings about unencrypted keys go to stderr so they survive stdout
/// redirection.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    fn unencrypted_banner() {
        eprintln!("WARNING!! Key file not encrypted!!");
        eprintln!("Anyone who can read the key file can take everything!");
        eprintln!("You should start over and use a good passphrase!");
    }
}

impl KeyFileObserver for ConsoleObserver {
    fn on_event(&self, event: &KeyFileEvent) {
        match event {
            KeyFileEvent::UnencryptedKeyLoaded { .. } => Self::unencrypted_banner(),
            KeyFileEvent::UnencryptedKeyWritten { path } => {
                Self::unencrypted_banner();
                eprintln!("Saved unencrypted key at {}", path.display());
            }
            KeyFileEvent::EncryptedKeyWritten { path } => {
                println!("Wrote encrypted key to {}", path.display());
            }
            KeyFileEvent::KeyFileMissing { path } => {
                println!("No file {}, generating.", path.display());
            }
            KeyFileEvent::PassphraseMismatch => {
                eprintln!("Passphrases do not match. Please try again.");
            }
        }
    }
}

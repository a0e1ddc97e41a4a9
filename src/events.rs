//! Operator-facing diagnostics
//!
//! The key file service never prints. It reports what happened through a
//! [`KeyFileObserver`], and the caller decides how loud to be.

use std::cell::RefCell;
use std::path::PathBuf;

use tracing::{info, warn};

/// Something an operator should know about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFileEvent {
    /// An unencrypted key file was read
    UnencryptedKeyLoaded { path: PathBuf },
    /// A key was written without encryption
    UnencryptedKeyWritten { path: PathBuf },
    /// A key was written sealed under a passphrase
    EncryptedKeyWritten { path: PathBuf },
    /// No key file existed; a new secret is being generated
    KeyFileMissing { path: PathBuf },
    /// The two passphrase entries differed; the prompt will repeat
    PassphraseMismatch,
}

impl KeyFileEvent {
    /// Check if this event warns about an unprotected key
    pub fn is_unencrypted_warning(&self) -> bool {
        matches!(
            self,
            Self::UnencryptedKeyLoaded { .. } | Self::UnencryptedKeyWritten { .. }
        )
    }
}

/// Receives diagnostic events from the key file service
pub trait KeyFileObserver {
    fn on_event(&self, event: &KeyFileEvent);
}

impl<F> KeyFileObserver for F
where
    F: Fn(&KeyFileEvent),
{
    fn on_event(&self, event: &KeyFileEvent) {
        self(event)
    }
}

/// Observer that forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl KeyFileObserver for TracingObserver {
    fn on_event(&self, event: &KeyFileEvent) {
        match event {
            KeyFileEvent::UnencryptedKeyLoaded { path } => {
                warn!(path = %path.display(), "key file not encrypted; anyone who can read it has the key");
            }
            KeyFileEvent::UnencryptedKeyWritten { path } => {
                warn!(path = %path.display(), "saved unencrypted key file");
            }
            KeyFileEvent::EncryptedKeyWritten { path } => {
                info!(path = %path.display(), "wrote encrypted key file");
            }
            KeyFileEvent::KeyFileMissing { path } => {
                info!(path = %path.display(), "no key file found, generating a new key");
            }
            KeyFileEvent::PassphraseMismatch => {
                warn!("passphrases did not match");
            }
        }
    }
}

/// Observer that keeps every event, for inspection after the fact
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<KeyFileEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All events received so far, oldest first
    pub fn events(&self) -> Vec<KeyFileEvent> {
        self.events.borrow().clone()
    }

    /// Number of unencrypted-key warnings received
    pub fn warning_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.is_unencrypted_warning())
            .count()
    }
}

impl KeyFileObserver for RecordingObserver {
    fn on_event(&self, event: &KeyFileEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

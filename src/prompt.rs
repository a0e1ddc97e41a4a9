//! Passphrase acquisition
//!
//! [`TerminalPrompt`] reads from the `KEYFILE_PASSPHRASE` environment
//! variable when it is set, and otherwise asks on the terminal with echo
//! suppressed. [`ScriptedPrompt`] replays a fixed list, for tests and
//! automation.

use std::collections::VecDeque;

use crate::crypto::Passphrase;
use crate::error::{KeyFileError, KeyFileResult};
use crate::events::{KeyFileEvent, KeyFileObserver};

/// The environment variable name for providing the passphrase
pub const PASSPHRASE_ENV_VAR: &str = "KEYFILE_PASSPHRASE";

/// Prompt shown for the first (or only) passphrase entry
pub const PASSPHRASE_PROMPT: &str = "passphrase: ";

/// Prompt shown for the confirmation entry
pub const REPEAT_PROMPT: &str = "repeat passphrase: ";

/// A source of passphrases
pub trait PassphrasePrompt {
    /// Read one passphrase, showing `prompt` if the source is interactive
    fn read_passphrase(&mut self, prompt: &str) -> KeyFileResult<Passphrase>;
}

/// Reads passphrases from the environment or the terminal
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    use_env: bool,
}

impl TerminalPrompt {
    /// Prompt on the terminal, honoring `KEYFILE_PASSPHRASE` first
    pub fn new() -> Self {
        Self { use_env: true }
    }

    /// Always prompt on the terminal
    pub fn without_env() -> Self {
        Self { use_env: false }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphrasePrompt for TerminalPrompt {
    fn read_passphrase(&mut self, prompt: &str) -> KeyFileResult<Passphrase> {
        // An empty variable is a real answer: store unencrypted
        if self.use_env {
            if let Ok(value) = std::env::var(PASSPHRASE_ENV_VAR) {
                return Ok(Passphrase::from(value));
            }
        }

        rpassword::prompt_password(prompt)
            .map(Passphrase::from)
            .map_err(|e| KeyFileError::Prompt(format!("failed to read passphrase: {}", e)))
    }
}

/// Replays a fixed sequence of passphrases
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Passphrase>,
    prompts: Vec<String>,
}

impl ScriptedPrompt {
    /// Create a prompt that answers with `answers` in order
    pub fn new<I, P>(answers: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Passphrase>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Prompts shown so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl PassphrasePrompt for ScriptedPrompt {
    fn read_passphrase(&mut self, prompt: &str) -> KeyFileResult<Passphrase> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| KeyFileError::Prompt("no more scripted passphrases".to_string()))
    }
}

/// Check that two passphrase entries agree
pub fn confirm(first: &Passphrase, second: &Passphrase) -> bool {
    first.as_bytes() == second.as_bytes()
}

/// Ask for a new passphrase twice, repeating until both entries match
pub fn prompt_new_passphrase(
    prompt: &mut dyn PassphrasePrompt,
    observer: &dyn KeyFileObserver,
) -> KeyFileResult<Passphrase> {
    loop {
        let first = prompt.read_passphrase(PASSPHRASE_PROMPT)?;
        let second = prompt.read_passphrase(REPEAT_PROMPT)?;

        if confirm(&first, &second) {
            return Ok(first);
        }

        observer.on_event(&KeyFileEvent::PassphraseMismatch);
    }
}

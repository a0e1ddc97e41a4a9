//! Key file service
//!
//! Loads and saves key secrets through the envelope format, with
//! interactive variants that ask a [`PassphrasePrompt`] and a one-stop
//! [`KeyFileService::read_or_create`] that bootstraps a missing file.

use std::io;
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::crypto::{KeySecret, Passphrase};
use crate::envelope::{detect_format, Envelope, EnvelopeFormat, ENCRYPTED_HEX_LEN};
use crate::error::{KeyFileError, KeyFileResult};
use crate::events::{KeyFileEvent, KeyFileObserver};
use crate::prompt::{prompt_new_passphrase, PassphrasePrompt, PASSPHRASE_PROMPT};
use crate::storage;

/// What a key file holds, learned without a passphrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFileStatus {
    pub path: PathBuf,
    pub format: EnvelopeFormat,
    /// Size on disk in bytes, including the trailing newline
    pub file_size: u64,
}

impl KeyFileStatus {
    /// Check if opening this file needs a passphrase
    pub fn is_encrypted(&self) -> bool {
        self.format.is_encrypted()
    }
}

/// Service for key file persistence
pub struct KeyFileService<'a> {
    observer: &'a dyn KeyFileObserver,
    allow_unencrypted: bool,
}

impl<'a> KeyFileService<'a> {
    /// Create a new key file service reporting to `observer`
    pub fn new(observer: &'a dyn KeyFileObserver) -> Self {
        Self {
            observer,
            allow_unencrypted: true,
        }
    }

    /// Refuse (or permit) saving with an empty passphrase
    ///
    /// Loading an existing unencrypted file is always allowed.
    pub fn with_unencrypted_allowed(mut self, allow: bool) -> Self {
        self.allow_unencrypted = allow;
        self
    }

    /// Load a secret from `path`
    ///
    /// The passphrase is ignored if the file is unencrypted; that case emits
    /// a warning event.
    pub fn load(&self, path: &Path, passphrase: &Passphrase) -> KeyFileResult<KeySecret> {
        let contents = storage::read_key_file(path)?;
        let envelope = Envelope::decode(&contents, path)?;

        if envelope.format() == EnvelopeFormat::Plaintext {
            self.emit(KeyFileEvent::UnencryptedKeyLoaded {
                path: path.to_path_buf(),
            });
        }

        envelope.open(passphrase)
    }

    /// Save a secret to `path`, encrypted unless the passphrase is empty
    pub fn save(
        &self,
        path: &Path,
        secret: &KeySecret,
        passphrase: &Passphrase,
    ) -> KeyFileResult<()> {
        self.save_with_rng(path, secret, passphrase, &mut OsRng)
    }

    /// Save a secret, drawing the salt from `rng`
    pub fn save_with_rng<R: RngCore + CryptoRng>(
        &self,
        path: &Path,
        secret: &KeySecret,
        passphrase: &Passphrase,
        rng: &mut R,
    ) -> KeyFileResult<()> {
        if passphrase.is_empty() && !self.allow_unencrypted {
            return Err(KeyFileError::Config(
                "unencrypted key files are disabled; a passphrase is required".to_string(),
            ));
        }

        let envelope = Envelope::seal(secret, passphrase, rng)?;
        let contents = envelope.encode()?;
        storage::write_key_file(path, &contents)?;

        let path = path.to_path_buf();
        match envelope.format() {
            EnvelopeFormat::Plaintext => self.emit(KeyFileEvent::UnencryptedKeyWritten { path }),
            EnvelopeFormat::Encrypted => self.emit(KeyFileEvent::EncryptedKeyWritten { path }),
        }
        Ok(())
    }

    /// Load a secret, asking for the passphrase only if the file could be
    /// encrypted
    ///
    /// Files smaller than an encrypted envelope are loaded without asking.
    pub fn load_interactive(
        &self,
        path: &Path,
        prompt: &mut dyn PassphrasePrompt,
    ) -> KeyFileResult<KeySecret> {
        let size = storage::key_file_size(path)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no key file at {}", path.display()),
            )
        })?;

        if size < ENCRYPTED_HEX_LEN as u64 {
            debug!(size, "key file too small to be encrypted, skipping prompt");
            return self.load(path, &Passphrase::empty());
        }

        let passphrase = prompt.read_passphrase(PASSPHRASE_PROMPT)?;
        self.load(path, &passphrase)
    }

    /// Save a secret, asking for a new passphrase twice
    ///
    /// Mismatched entries repeat the question. An empty passphrase stores
    /// the key unencrypted.
    pub fn save_interactive(
        &self,
        path: &Path,
        secret: &KeySecret,
        prompt: &mut dyn PassphrasePrompt,
    ) -> KeyFileResult<()> {
        let passphrase = prompt_new_passphrase(prompt, self.observer)?;
        self.save(path, secret, &passphrase)
    }

    /// Return the secret at `path`, creating it first if the file is missing
    ///
    /// A new secret is saved interactively and then read back through the
    /// normal load path, so what the caller gets is exactly what is on disk.
    pub fn read_or_create(
        &self,
        path: &Path,
        prompt: &mut dyn PassphrasePrompt,
    ) -> KeyFileResult<KeySecret> {
        self.read_or_create_with_rng(path, prompt, &mut OsRng)
    }

    /// [`read_or_create`](Self::read_or_create) with an explicit random source
    pub fn read_or_create_with_rng<R: RngCore + CryptoRng>(
        &self,
        path: &Path,
        prompt: &mut dyn PassphrasePrompt,
        rng: &mut R,
    ) -> KeyFileResult<KeySecret> {
        if storage::key_file_size(path)?.is_none() {
            self.emit(KeyFileEvent::KeyFileMissing {
                path: path.to_path_buf(),
            });

            let secret = KeySecret::generate(rng)?;
            let passphrase = prompt_new_passphrase(prompt, self.observer)?;
            self.save_with_rng(path, &secret, &passphrase, rng)?;
        }

        self.load_interactive(path, prompt)
    }

    /// Re-save a key file under a new passphrase
    ///
    /// An empty `new` passphrase rewrites the file unencrypted.
    pub fn change_passphrase(
        &self,
        path: &Path,
        old: &Passphrase,
        new: &Passphrase,
    ) -> KeyFileResult<()> {
        let secret = self.load(path, old)?;
        self.save(path, &secret, new)
    }

    /// Interactive [`change_passphrase`](Self::change_passphrase)
    pub fn change_passphrase_interactive(
        &self,
        path: &Path,
        prompt: &mut dyn PassphrasePrompt,
    ) -> KeyFileResult<()> {
        let secret = self.load_interactive(path, prompt)?;
        self.save_interactive(path, &secret, prompt)
    }

    /// Report a key file's format without opening it
    pub fn inspect(&self, path: &Path) -> KeyFileResult<KeyFileStatus> {
        let contents = storage::read_key_file(path)?;
        let format = detect_format(&contents, path)?;

        Ok(KeyFileStatus {
            path: path.to_path_buf(),
            format,
            file_size: contents.len() as u64,
        })
    }

    fn emit(&self, event: KeyFileEvent) {
        self.observer.on_event(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingObserver;
    use crate::prompt::ScriptedPrompt;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("privkey.hex");
        (temp_dir, path)
    }

    fn random_secret() -> KeySecret {
        KeySecret::generate(&mut OsRng).unwrap()
    }

    #[test]
    fn test_save_load_encrypted() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();
        let pass = Passphrase::from("hunter2");

        service.save(&path, &secret, &pass).unwrap();
        let loaded = service.load(&path, &pass).unwrap();

        assert_eq!(loaded.as_bytes(), secret.as_bytes());
        assert_eq!(
            observer.events(),
            vec![KeyFileEvent::EncryptedKeyWritten { path: path.clone() }]
        );

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.len(), ENCRYPTED_HEX_LEN + 1);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_save_load_plaintext() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();

        service.save(&path, &secret, &Passphrase::empty()).unwrap();
        let loaded = service.load(&path, &Passphrase::empty()).unwrap();

        assert_eq!(loaded.as_bytes(), secret.as_bytes());
        let decoded = hex::decode(fs::read_to_string(&path).unwrap().trim()).unwrap();
        assert_eq!(decoded.len(), 96);

        assert_eq!(observer.warning_count(), 2);
        assert_eq!(
            observer.events(),
            vec![
                KeyFileEvent::UnencryptedKeyWritten { path: path.clone() },
                KeyFileEvent::UnencryptedKeyLoaded { path: path.clone() },
            ]
        );
    }

    #[test]
    fn test_wrong_passphrase() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);

        service
            .save(&path, &random_secret(), &Passphrase::from("right"))
            .unwrap();
        let result = service.load(&path, &Passphrase::from("wrong"));
        assert!(matches!(result, Err(KeyFileError::Authentication)));
    }

    #[test]
    fn test_tampered_file() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let pass = Passphrase::from("pw");

        service.save(&path, &random_secret(), &pass).unwrap();
        let mut raw = hex::decode(fs::read_to_string(&path).unwrap().trim()).unwrap();
        raw[100] ^= 0x10;
        fs::write(&path, format!("{}\n", hex::encode(&raw))).unwrap();

        let result = service.load(&path, &pass);
        assert!(matches!(result, Err(KeyFileError::Authentication)));
    }

    #[test]
    fn test_bad_length_names_file() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);

        fs::write(&path, format!("{}\n", hex::encode([1u8; 50]))).unwrap();
        let err = service.load(&path, &Passphrase::empty()).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("privkey.hex"));

        fs::write(&path, format!("{}\n", hex::encode([1u8; 200]))).unwrap();
        assert!(service.load(&path, &Passphrase::empty()).unwrap_err().is_format());
    }

    #[test]
    fn test_load_missing_file() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);

        let err = service.load(&path, &Passphrase::empty()).unwrap_err();
        assert!(err.is_not_found());

        let mut prompt = ScriptedPrompt::new(["pw"]);
        let err = service.load_interactive(&path, &mut prompt).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(prompt.remaining(), 1);
    }

    #[test]
    fn test_saves_differ() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();
        let pass = Passphrase::from("same");

        service.save(&path, &secret, &pass).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        service.save(&path, &secret, &pass).unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_unencrypted_refused_when_disabled() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer).with_unencrypted_allowed(false);

        let result = service.save(&path, &random_secret(), &Passphrase::empty());
        assert!(matches!(result, Err(KeyFileError::Config(_))));
        assert!(!path.exists());
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_load_interactive_skips_prompt_for_plaintext() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();
        service.save(&path, &secret, &Passphrase::empty()).unwrap();

        let mut prompt = ScriptedPrompt::new(Vec::<&str>::new());
        let loaded = service.load_interactive(&path, &mut prompt).unwrap();

        assert_eq!(loaded.as_bytes(), secret.as_bytes());
        assert!(prompt.prompts().is_empty());
    }

    #[test]
    fn test_load_interactive_prompts_for_encrypted() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();
        service
            .save(&path, &secret, &Passphrase::from("pw"))
            .unwrap();

        let mut prompt = ScriptedPrompt::new(["pw"]);
        let loaded = service.load_interactive(&path, &mut prompt).unwrap();

        assert_eq!(loaded.as_bytes(), secret.as_bytes());
        assert_eq!(prompt.prompts(), &[PASSPHRASE_PROMPT.to_string()]);
    }

    #[test]
    fn test_save_interactive_retries_mismatch() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();

        let mut prompt = ScriptedPrompt::new(["pw", "wp", "pw", "pw"]);
        service.save_interactive(&path, &secret, &mut prompt).unwrap();

        assert_eq!(
            observer.events(),
            vec![
                KeyFileEvent::PassphraseMismatch,
                KeyFileEvent::EncryptedKeyWritten { path: path.clone() },
            ]
        );
        let loaded = service.load(&path, &Passphrase::from("pw")).unwrap();
        assert_eq!(loaded.as_bytes(), secret.as_bytes());
    }

    #[test]
    fn test_read_or_create_bootstraps_encrypted() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);

        let mut prompt = ScriptedPrompt::new(["boot", "boot", "boot"]);
        let created = service.read_or_create(&path, &mut prompt).unwrap();

        assert!(path.exists());
        assert_eq!(prompt.remaining(), 0);
        assert_eq!(
            observer.events()[0],
            KeyFileEvent::KeyFileMissing { path: path.clone() }
        );

        let loaded = service.load(&path, &Passphrase::from("boot")).unwrap();
        assert_eq!(loaded.as_bytes(), created.as_bytes());
        assert!(service.inspect(&path).unwrap().is_encrypted());
    }

    #[test]
    fn test_read_or_create_bootstraps_plaintext() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);

        // Empty passphrase twice; the read-back needs no prompt
        let mut prompt = ScriptedPrompt::new(["", ""]);
        let created = service.read_or_create(&path, &mut prompt).unwrap();

        assert_eq!(prompt.prompts().len(), 2);
        let loaded = service.load(&path, &Passphrase::empty()).unwrap();
        assert_eq!(loaded.as_bytes(), created.as_bytes());
    }

    #[test]
    fn test_read_or_create_reads_existing() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();
        service
            .save(&path, &secret, &Passphrase::from("pw"))
            .unwrap();

        let mut prompt = ScriptedPrompt::new(["pw"]);
        let loaded = service.read_or_create(&path, &mut prompt).unwrap();

        assert_eq!(loaded.as_bytes(), secret.as_bytes());
        assert!(!observer
            .events()
            .iter()
            .any(|e| matches!(e, KeyFileEvent::KeyFileMissing { .. })));
    }

    #[test]
    fn test_read_or_create_wrong_readback_passphrase() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);

        let mut prompt = ScriptedPrompt::new(["boot", "boot", "typo"]);
        let result = service.read_or_create(&path, &mut prompt);

        assert!(matches!(result, Err(KeyFileError::Authentication)));
        // The file was still written
        assert!(path.exists());
    }

    #[test]
    fn test_change_passphrase() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();
        service
            .save(&path, &secret, &Passphrase::from("old"))
            .unwrap();

        service
            .change_passphrase(&path, &Passphrase::from("old"), &Passphrase::from("new"))
            .unwrap();

        assert!(service.load(&path, &Passphrase::from("old")).is_err());
        let loaded = service.load(&path, &Passphrase::from("new")).unwrap();
        assert_eq!(loaded.as_bytes(), secret.as_bytes());
    }

    #[test]
    fn test_change_passphrase_wrong_old_leaves_file() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        service
            .save(&path, &random_secret(), &Passphrase::from("old"))
            .unwrap();
        let before = fs::read(&path).unwrap();

        let result =
            service.change_passphrase(&path, &Passphrase::from("nope"), &Passphrase::from("new"));

        assert!(matches!(result, Err(KeyFileError::Authentication)));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_change_passphrase_interactive_to_plaintext() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        let secret = random_secret();
        service
            .save(&path, &secret, &Passphrase::from("old"))
            .unwrap();

        let mut prompt = ScriptedPrompt::new(["old", "", ""]);
        service
            .change_passphrase_interactive(&path, &mut prompt)
            .unwrap();

        let status = service.inspect(&path).unwrap();
        assert_eq!(status.format, EnvelopeFormat::Plaintext);
        let loaded = service.load(&path, &Passphrase::empty()).unwrap();
        assert_eq!(loaded.as_bytes(), secret.as_bytes());
    }

    #[test]
    fn test_inspect() {
        let (_temp_dir, path) = setup();
        let observer = RecordingObserver::new();
        let service = KeyFileService::new(&observer);
        service
            .save(&path, &random_secret(), &Passphrase::empty())
            .unwrap();

        let status = service.inspect(&path).unwrap();
        assert_eq!(status.path, path);
        assert_eq!(status.format, EnvelopeFormat::Plaintext);
        assert_eq!(status.file_size, 193);
        assert!(!status.is_encrypted());
    }
}

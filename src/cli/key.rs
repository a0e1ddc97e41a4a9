//! Key file CLI commands
//!
//! Bridges the clap subcommands to [`KeyFileService`].

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::{paths::KeyFilePaths, settings::Settings};
use crate::error::KeyFileResult;
use crate::prompt::TerminalPrompt;
use crate::services::KeyFileService;

use super::observer::ConsoleObserver;

/// Key file selection shared by every key command
#[derive(Args, Debug, Clone)]
pub struct KeyFileArgs {
    /// Key file to use (defaults to the one in the config directory)
    #[arg(short, long)]
    pub key_file: Option<PathBuf>,
}

/// Key file commands
#[derive(Subcommand)]
pub enum KeyCommands {
    /// Open the key file, generating and saving a new key if it is missing
    Init(KeyFileArgs),

    /// Verify the key file opens with your passphrase
    Check(KeyFileArgs),

    /// Show whether the key file is encrypted, without a passphrase
    Status(KeyFileArgs),

    /// Change the key file passphrase
    #[command(alias = "change-passphrase")]
    Passwd(KeyFileArgs),
}

/// Handle key file commands
pub fn handle_key_command(
    paths: &KeyFilePaths,
    settings: &Settings,
    cmd: KeyCommands,
) -> KeyFileResult<()> {
    let observer = ConsoleObserver;
    let service =
        KeyFileService::new(&observer).with_unencrypted_allowed(settings.allow_unencrypted);

    match cmd {
        KeyCommands::Init(args) => {
            let path = resolve_key_file(paths, settings, args)?;
            let mut prompt = TerminalPrompt::new();
            let secret = service.read_or_create(&path, &mut prompt)?;

            println!(
                "Key ready: {} bytes ({} sub-keys) at {}",
                secret.as_bytes().len(),
                secret.sub_keys().count(),
                path.display()
            );
        }

        KeyCommands::Check(args) => {
            let path = resolve_key_file(paths, settings, args)?;
            let mut prompt = TerminalPrompt::new();
            service.load_interactive(&path, &mut prompt)?;

            println!("Key file {} opened successfully.", path.display());
        }

        KeyCommands::Status(args) => {
            let path = resolve_key_file(paths, settings, args)?;
            let status = service.inspect(&path)?;

            println!("Key File Status");
            println!("===============");
            println!("Path:   {}", status.path.display());
            println!("Format: {}", status.format);
            println!("Size:   {} bytes", status.file_size);
            if !status.is_encrypted() {
                println!();
                println!("This key file is not protected by a passphrase.");
                println!("Run 'keyfile passwd' to encrypt it.");
            }
        }

        KeyCommands::Passwd(args) => {
            let path = resolve_key_file(paths, settings, args)?;
            // Old and new passphrases must come from a human
            let mut prompt = TerminalPrompt::without_env();
            service.change_passphrase_interactive(&path, &mut prompt)?;

            println!("Passphrase changed for {}.", path.display());
        }
    }

    Ok(())
}

/// Pick the key file path, creating the config directory for the default one
fn resolve_key_file(
    paths: &KeyFilePaths,
    settings: &Settings,
    args: KeyFileArgs,
) -> KeyFileResult<PathBuf> {
    match args.key_file {
        Some(path) => Ok(path),
        None => {
            paths.ensure_directories()?;
            Ok(settings.default_key_file(paths))
        }
    }
}

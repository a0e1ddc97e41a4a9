use anyhow::Result;
use clap::{Parser, Subcommand};

use keyfile::cli::{handle_key_command, KeyCommands};
use keyfile::config::{paths::KeyFilePaths, settings::Settings};
use keyfile::prompt::PASSPHRASE_ENV_VAR;

#[derive(Parser)]
#[command(
    name = "keyfile",
    author = "Kaylee Beyene",
    version,
    about = "Passphrase-protected storage for 96-byte secret keys",
    long_about = "keyfile stores a 96-byte secret key as a single line of hex, \
                  sealed with XSalsa20-Poly1305 under a scrypt-derived key. \
                  An empty passphrase stores the key unencrypted."
)]
struct Cli {
    /// Log level, used when RUST_LOG is not set
    #[arg(long, global = true, env = "KEYFILE_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Key(KeyCommands),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = KeyFilePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    init_tracing(cli.log_level.as_deref().unwrap_or(&settings.log_level));

    match cli.command {
        Some(Commands::Key(cmd)) => {
            handle_key_command(&paths, &settings, cmd)?;
        }
        Some(Commands::Config) => {
            println!("keyfile Configuration");
            println!("=====================");
            println!("Config directory: {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Default key file: {}", settings.default_key_file(&paths).display());
            println!();
            println!("Settings:");
            println!("  Log level:         {}", settings.log_level);
            println!("  Allow unencrypted: {}", settings.allow_unencrypted);
            println!(
                "  Passphrase from env: {}",
                if std::env::var_os(PASSPHRASE_ENV_VAR).is_some() {
                    "yes"
                } else {
                    "no"
                }
            );
        }
        None => {
            println!("keyfile - passphrase-protected key storage");
            println!();
            println!("Run 'keyfile --help' for usage information.");
            println!("Run 'keyfile init' to create or open your key file.");
        }
    }

    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyfile={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

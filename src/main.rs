use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lockbox::auth::Prompt;
use lockbox::cli::{handle_config, handle_keyfile, handle_login, handle_setup, Workspace};
use lockbox::config::{settings::CONFIG_ENV_VAR, LockboxPaths};

/// Environment variable holding the log filter
const LOG_ENV_VAR: &str = "LOCKBOX_LOG";

#[derive(Parser)]
#[command(
    name = "lockbox",
    version,
    about = "Local command-line secrets manager",
    long_about = "Lockbox stores encrypted credentials in a local database. Every command \
                  re-derives the master key from your password (and optional key file) \
                  with Argon2id before any data is touched."
)]
struct Cli {
    /// Configuration file (defaults to <home>/config.yaml)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate, running first-time setup if needed
    Login,

    /// Set up the master password and key derivation parameters again
    Setup,

    /// Enable or disable the key file
    Keyfile,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = LockboxPaths::new()?;
    let mut workspace = Workspace::open(paths, cli.config)?;
    let mut prompt = Prompt::stdio();

    match cli.command {
        Some(Commands::Login) => handle_login(&mut workspace, &mut prompt)?,
        Some(Commands::Setup) => handle_setup(&mut workspace, &mut prompt)?,
        Some(Commands::Keyfile) => handle_keyfile(&mut workspace, &mut prompt)?,
        Some(Commands::Config) => handle_config(&workspace)?,
        None => {
            println!("Lockbox - Local secrets manager");
            println!();
            println!("Run 'lockbox --help' for usage information.");
            println!("Run 'lockbox login' to set up or check your master password.");
        }
    }

    Ok(())
}

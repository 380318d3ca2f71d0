//! Authentication CLI commands
//!
//! Handlers for `login`, `setup`, `keyfile` and `config`. Prompts go to
//! stderr through [`Prompt`]; results are printed on stdout.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::auth::{self, AuthSession, Prompt};
use crate::config::{Config, LockboxPaths};
use crate::error::LockboxResult;
use crate::storage::Store;

/// Everything a command needs: resolved paths, configuration and database
#[derive(Debug)]
pub struct Workspace {
    pub paths: LockboxPaths,
    pub config: Config,
    pub store: Store,
}

impl Workspace {
    /// Load the configuration and open the database
    ///
    /// `config_file` overrides `<home>/config.yaml`.
    pub fn open(paths: LockboxPaths, config_file: Option<PathBuf>) -> LockboxResult<Self> {
        let config_file = config_file.unwrap_or_else(|| paths.config_file());
        let config = Config::load(&config_file)?;
        let store = Store::open(config.database_path(&paths))?;

        debug!(
            config = %config_file.display(),
            database = %store.path().display(),
            "workspace opened"
        );

        Ok(Self {
            paths,
            config,
            store,
        })
    }

    /// Run the authentication gate
    pub fn authenticate<R: BufRead, W: Write>(
        &mut self,
        prompt: &mut Prompt<R, W>,
    ) -> LockboxResult<AuthSession> {
        auth::login(&mut self.config, &mut self.store, prompt)
    }
}

/// Authenticate and report success
pub fn handle_login<R: BufRead, W: Write>(
    workspace: &mut Workspace,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<()> {
    let was_set_up = workspace.config.is_set_up();
    workspace.authenticate(prompt)?;

    if was_set_up {
        println!("Authenticated.");
    } else {
        println!("Master password set up.");
    }
    Ok(())
}

/// Run setup again, replacing the derivation parameters and password
///
/// On a fresh install the gate's first run already is the setup.
pub fn handle_setup<R: BufRead, W: Write>(
    workspace: &mut Workspace,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<()> {
    let was_set_up = workspace.config.is_set_up();
    let session = workspace.authenticate(prompt)?;

    if was_set_up {
        let renewed = auth::setup(
            &session,
            &mut workspace.config,
            &mut workspace.store,
            prompt,
        )?;
        print_params(&renewed);
        println!("Master password changed.");
    } else {
        print_params(&session);
        println!("Master password set up.");
    }
    Ok(())
}

/// Turn the key file on or off, or forget its configured path
pub fn handle_keyfile<R: BufRead, W: Write>(
    workspace: &mut Workspace,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<()> {
    let session = workspace.authenticate(prompt)?;

    let renewed = auth::change_keyfile(
        &session,
        &mut workspace.config,
        &mut workspace.store,
        prompt,
    )?;

    match renewed {
        Some(_) if workspace.config.keyfile.enabled => {
            println!("Key file enabled; the master key has been changed.")
        }
        Some(_) => println!("Key file disabled; the master key has been changed."),
        None => println!("Key file settings unchanged."),
    }
    Ok(())
}

/// Show configuration and paths
pub fn handle_config(workspace: &Workspace) -> LockboxResult<()> {
    let config = &workspace.config;

    println!("Lockbox Configuration");
    println!("=====================");
    println!();
    println!("Paths:");
    println!("  Base directory: {}", workspace.paths.base_dir().display());
    match config.file() {
        Some(file) => println!("  Config file:    {}", file.display()),
        None => println!("  Config file:    (none)"),
    }
    println!("  Database:       {}", workspace.store.path().display());
    println!();

    match config.params() {
        Some(params) => {
            println!("Key Derivation (Argon2id):");
            println!("  Iterations: {}", params.iterations);
            println!("  Memory:     {} KiB", params.memory);
            println!("  Threads:    {}", params.threads);
        }
        None => println!("Master password: not set up (run 'lockbox login')"),
    }
    println!();

    if config.keyfile.enabled {
        match &config.keyfile.path {
            Some(path) => println!("Key file: enabled ({})", path),
            None => println!("Key file: enabled (path asked at login)"),
        }
    } else {
        println!("Key file: disabled");
    }

    if let Some(header) = workspace.store.header() {
        println!(
            "Master key established: {}",
            header.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}

fn print_params(session: &AuthSession) {
    let params = session.params();
    println!(
        "Argon2id: {} iterations, {} KiB, {} threads",
        params.iterations, params.memory, params.threads
    );
}

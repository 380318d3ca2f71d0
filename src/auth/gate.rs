//! Authentication gate
//!
//! Runs before every command that touches stored data. On first run it
//! negotiates the derivation parameters, the key file and a new password,
//! then writes the database key header and the configuration. On later runs
//! it re-derives the key from the password and persisted settings and checks
//! it against the database verifier.
//!
//! Either a complete [`AuthSession`] comes back or nothing persisted changes.

use std::io::{BufRead, Write};

use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::config::{Config, KeyfileSettings};
use crate::crypto::{derive_key, generate_salt, Argon2Params, Enclave};
use crate::error::{LockboxError, LockboxResult};
use crate::storage::Store;

use super::keyfile::{choose_keyfile, combine_keys, save_keyfile};
use super::params::ask_parameters;
use super::prompt::Prompt;
use super::session::AuthSession;

/// Everything needed to establish a new master key
struct Credentials {
    params: Argon2Params,
    keyfile: KeyfileSettings,
    password: Enclave,
}

/// Authenticate the current invocation
///
/// Runs first-run setup when the configuration has no `auth` record,
/// otherwise asks for the password and validates the derived key.
pub fn login<R: BufRead, W: Write>(
    config: &mut Config,
    store: &mut Store,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<AuthSession> {
    if config.is_set_up() {
        unlock(config, store, prompt)
    } else {
        first_run(config, store, prompt)
    }
}

/// Re-run setup for an authenticated session
///
/// New parameters, key file choice and password replace the current ones
/// and the database key header is rewritten. The session is only taken as
/// proof that [`login`] succeeded first.
pub fn setup<R: BufRead, W: Write>(
    _session: &AuthSession,
    config: &mut Config,
    store: &mut Store,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<AuthSession> {
    let credentials = negotiate(config, prompt)?;
    establish(config, store, prompt, credentials)
}

/// Change whether a key file is used
///
/// Path-only changes are saved and keep the current key. Turning the key
/// file on or off re-keys the database with the session password; the new
/// session is returned in that case. The new settings are written together
/// with the new key header, so a failed re-key leaves the configuration as
/// it was.
pub fn change_keyfile<R: BufRead, W: Write>(
    session: &AuthSession,
    config: &mut Config,
    store: &mut Store,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<Option<AuthSession>> {
    let was_enabled = config.keyfile.enabled;
    let mut staged = config.keyfile.clone();
    let used = choose_keyfile(prompt, &mut staged)?;
    if used {
        config.resolved_file()?;
    }

    if used == was_enabled {
        save_keyfile(config, staged)?;
        return Ok(None);
    }

    staged.enabled = used;
    if !used {
        staged.path = None;
    }

    let password = config
        .password()
        .ok_or_else(|| LockboxError::InvalidPassword("no authenticated password".to_string()))?
        .open()
        .and_then(Enclave::from_buffer)?;

    let credentials = Credentials {
        params: *session.params(),
        keyfile: staged,
        password,
    };
    establish(config, store, prompt, credentials).map(Some)
}

fn first_run<R: BufRead, W: Write>(
    config: &mut Config,
    store: &mut Store,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<AuthSession> {
    if store.is_initialized() {
        return Err(LockboxError::Config(format!(
            "database {} already has a master key but the configuration has no auth parameters",
            store.path().display()
        )));
    }

    info!("no master password configured, running first-time setup");
    prompt.say("Setting up a master password for Lockbox.")?;

    let credentials = negotiate(config, prompt)?;
    establish(config, store, prompt, credentials)
}

fn unlock<R: BufRead, W: Write>(
    config: &mut Config,
    store: &mut Store,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<AuthSession> {
    let params = config
        .params()
        .ok_or_else(|| LockboxError::Config("missing auth parameters".to_string()))?;
    params.validate()?;

    if !store.is_initialized() {
        return Err(LockboxError::Config(format!(
            "database {} has no master key header; restore the database file or remove \
             the auth section from the configuration to set up a new master password",
            store.path().display()
        )));
    }
    let salt = store.salt()?;

    let password = prompt.password("Enter master password")?;
    let key = derive_master_key(prompt, &config.keyfile, &password, &salt, &params)?;

    if let Err(e) = store.verify(&key) {
        warn!("master key did not validate against the database");
        return Err(e);
    }

    config.set_auth(password, params);
    debug!("master key validated");
    Ok(AuthSession::new(params, key))
}

fn negotiate<R: BufRead, W: Write>(
    config: &Config,
    prompt: &mut Prompt<R, W>,
) -> LockboxResult<Credentials> {
    let params = ask_parameters(prompt)?;
    params.validate()?;

    let mut keyfile = config.keyfile.clone();
    keyfile.enabled = choose_keyfile(prompt, &mut keyfile)?;
    if !keyfile.enabled {
        keyfile.path = None;
    }

    let password = new_password(prompt)?;

    Ok(Credentials {
        params,
        keyfile,
        password,
    })
}

/// Derive the key, then write the key header and the configuration
///
/// A failed configuration save rolls the key header back.
fn establish<R: BufRead, W: Write>(
    config: &mut Config,
    store: &mut Store,
    prompt: &mut Prompt<R, W>,
    credentials: Credentials,
) -> LockboxResult<AuthSession> {
    let Credentials {
        params,
        keyfile,
        password,
    } = credentials;

    let salt = generate_salt();
    let key = derive_master_key(prompt, &keyfile, &password, &salt, &params)?;

    let previous_header = store.initialize(&key, &salt)?;
    let previous_keyfile = std::mem::replace(&mut config.keyfile, keyfile);
    let previous_auth = config.auth.take();
    config.set_auth(password, params);

    if let Err(e) = config.save() {
        config.keyfile = previous_keyfile;
        config.auth = previous_auth;
        if let Err(restore_err) = store.restore(previous_header) {
            warn!(error = %restore_err, "failed to roll back database key header");
        }
        return Err(e);
    }

    info!(
        iterations = params.iterations,
        memory = params.memory,
        threads = params.threads,
        keyfile = config.keyfile.enabled,
        "master key established"
    );
    Ok(AuthSession::new(params, key))
}

fn derive_master_key<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    keyfile: &KeyfileSettings,
    password: &Enclave,
    salt: &[u8],
    params: &Argon2Params,
) -> LockboxResult<Enclave> {
    let combined;
    let secret = if keyfile.enabled {
        combined = combine_keys(prompt, keyfile.path.as_deref(), password)?;
        &combined
    } else {
        password
    };

    derive_key(secret, salt, params)
}

fn new_password<R: BufRead, W: Write>(prompt: &mut Prompt<R, W>) -> LockboxResult<Enclave> {
    let password = prompt.password("New master password")?;
    let confirmation = prompt.password("Confirm master password")?;

    let mut first = password.open()?;
    let mut second = confirmation.open()?;
    let empty = first.is_empty();
    let matches = bool::from(first.bytes().ct_eq(second.bytes()));
    first.destroy();
    second.destroy();

    if empty {
        return Err(LockboxError::InvalidPassword(
            "master password cannot be empty".to_string(),
        ));
    }
    if !matches {
        return Err(LockboxError::PasswordMismatch);
    }

    Ok(password)
}

//! Key file resolution and combination
//!
//! A key file strengthens the master password. Its contribution is always
//! 32 bytes: the raw contents when the file is exactly 32 bytes long, the
//! SHA-256 digest of the contents otherwise. The combined secret fed to
//! Argon2 is `contribution ++ password`.

use std::io::{BufRead, Write};

use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::config::{Config, KeyfileSettings};
use crate::crypto::{Enclave, LockedBuffer};
use crate::error::{LockboxError, LockboxResult};

use super::prompt::Prompt;

/// Size of the key file contribution
pub const KEYFILE_SIZE: usize = 32;

/// Ask whether a key file is used, adjusting `keyfile` in memory
///
/// On "yes", a second question decides whether the configured path is kept;
/// answering "no" clears it so the path is asked for at login.
pub fn choose_keyfile<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    keyfile: &mut KeyfileSettings,
) -> LockboxResult<bool> {
    if !prompt.confirm("Would you like to use a key file?")? {
        return Ok(false);
    }

    if !prompt.confirm("Would you like to use the key file path set in the configuration?")? {
        keyfile.path = None;
    }

    Ok(true)
}

/// Ask whether a key file is used and persist a cleared path
///
/// A "no" leaves the configuration untouched. A "yes" needs a configuration
/// file to persist to, else [`LockboxError::ConfigUnresolved`]. If the path
/// is cleared the configuration is saved; when that fails the in-memory
/// settings are restored.
///
/// `keyfile.enabled` is not changed here. Flipping it changes the master
/// key, so the caller persists it together with a new key header.
pub fn ask_keyfile<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    config: &mut Config,
) -> LockboxResult<bool> {
    let mut staged = config.keyfile.clone();
    let used = choose_keyfile(prompt, &mut staged)?;
    if used {
        config.resolved_file()?;
    }

    save_keyfile(config, staged)?;
    Ok(used)
}

/// Replace the key file settings and save them if they changed
///
/// On a failed save the previous settings are put back.
pub(crate) fn save_keyfile(config: &mut Config, staged: KeyfileSettings) -> LockboxResult<()> {
    if staged == config.keyfile {
        return Ok(());
    }

    let previous = std::mem::replace(&mut config.keyfile, staged);
    if let Err(e) = config.save() {
        config.keyfile = previous;
        return Err(e);
    }

    info!("key file path cleared from configuration");
    Ok(())
}

/// Combine the key file (if any) with the sealed password
///
/// The path comes from `configured_path`, or is read from the prompt when
/// unset. An empty path means no key file: the result holds the password
/// alone.
pub fn combine_keys<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    configured_path: Option<&str>,
    password: &Enclave,
) -> LockboxResult<Enclave> {
    let path = match configured_path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => path.to_string(),
        None => prompt.line("Key file path")?,
    };
    let path = path.trim().trim_matches(|c| c == '"' || c == '\'');

    let contribution = if path.is_empty() {
        None
    } else {
        Some(read_keyfile(path)?)
    };

    let mut pwd = password
        .open()
        .map_err(|e| LockboxError::InvalidPassword(e.to_string()))?;

    let mut combined = LockedBuffer::with_capacity(KEYFILE_SIZE + pwd.len());
    if let Some(mut key) = contribution {
        combined.extend_from_slice(key.bytes());
        key.destroy();
    }
    combined.extend_from_slice(pwd.bytes());
    pwd.destroy();

    Enclave::from_buffer(combined)
}

/// Read a key file and normalize it to 32 bytes
fn read_keyfile(path: &str) -> LockboxResult<LockedBuffer> {
    let mut contents = std::fs::read(path)
        .map(LockedBuffer::new)
        .map_err(|e| LockboxError::KeyfileUnreadable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    if contents.len() == KEYFILE_SIZE {
        debug!("using raw 32-byte key file");
        return Ok(contents);
    }

    debug!(size = contents.len(), "hashing key file contents");
    let mut digest = Sha256::digest(contents.bytes());
    contents.destroy();

    let key = LockedBuffer::from_slice(&digest);
    digest.as_mut_slice().zeroize();
    Ok(key)
}

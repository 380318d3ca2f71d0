//! Configuration document for Lockbox
//!
//! The configuration is a YAML file with three namespaces:
//!
//! ```yaml
//! auth:
//!   memory: 1048576
//!   iterations: 1
//!   threads: 8
//! keyfile:
//!   enabled: true
//!   path: /home/me/lockbox.key
//! database:
//!   path: /home/me/.config/lockbox/data/lockbox.db
//! ```
//!
//! The `auth` record also carries the sealed password for the running
//! process. It is never serialized.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::paths::LockboxPaths;
use crate::crypto::{Argon2Params, Enclave};
use crate::error::{LockboxError, LockboxResult};
use crate::storage::write_atomic;

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV_VAR: &str = "LOCKBOX_CONFIG";

/// The `auth` namespace
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Sealed master password, in memory only
    #[serde(skip)]
    pub password: Option<Enclave>,
    /// Argon2 memory cost in KiB
    pub memory: u32,
    /// Argon2 time cost
    pub iterations: u32,
    /// Argon2 parallelism
    pub threads: u32,
}

impl AuthSettings {
    /// The persisted derivation parameters
    pub fn params(&self) -> Argon2Params {
        Argon2Params::new(self.iterations, self.memory, self.threads)
    }
}

/// The `keyfile` namespace
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyfileSettings {
    /// Whether a key file strengthens the password
    #[serde(default)]
    pub enabled: bool,
    /// Key file location; unset means "ask on every login"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// The `database` namespace
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file location; defaults to `<home>/data/lockbox.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Process-wide configuration store
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// File this configuration is bound to
    #[serde(skip)]
    file: Option<PathBuf>,

    /// Key derivation parameters; `None` until first-run setup completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSettings>,

    /// Key file settings
    #[serde(default)]
    pub keyfile: KeyfileSettings,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl Config {
    /// Create an empty configuration bound to `path`
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            ..Default::default()
        }
    }

    /// Load configuration from `path`, or defaults bound to `path` if missing
    pub fn load(path: impl Into<PathBuf>) -> LockboxResult<Self> {
        let path = path.into();
        config_type(&path)?;

        if !path.exists() {
            debug!(path = %path.display(), "no configuration file yet");
            return Ok(Self::with_file(path));
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            LockboxError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| {
                LockboxError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        };
        config.file = Some(path);

        Ok(config)
    }

    /// The file this configuration is bound to
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Whether first-run setup has completed
    pub fn is_set_up(&self) -> bool {
        self.auth.is_some()
    }

    /// Persisted derivation parameters, if any
    pub fn params(&self) -> Option<Argon2Params> {
        self.auth.as_ref().map(AuthSettings::params)
    }

    /// The sealed password of the current process, if authenticated
    pub fn password(&self) -> Option<&Enclave> {
        self.auth.as_ref().and_then(|auth| auth.password.as_ref())
    }

    /// Replace the whole `auth` record
    ///
    /// In memory only; call [`save`](Self::save) to persist the parameters.
    pub fn set_auth(&mut self, password: Enclave, params: Argon2Params) {
        self.auth = Some(AuthSettings {
            password: Some(password),
            memory: params.memory,
            iterations: params.iterations,
            threads: params.threads,
        });
    }

    /// Resolve the database file location
    pub fn database_path(&self, paths: &LockboxPaths) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| paths.database_file())
    }

    /// The bound file, if it is one [`save`](Self::save) can write
    pub fn resolved_file(&self) -> LockboxResult<&Path> {
        let path = self.file.as_deref().ok_or_else(|| {
            LockboxError::ConfigUnresolved("no configuration file is in use".to_string())
        })?;
        config_type(path)?;
        Ok(path)
    }

    /// Write the configuration to its file atomically
    ///
    /// # Errors
    ///
    /// [`LockboxError::ConfigUnresolved`] if no file is bound or its type is
    /// unknown, [`LockboxError::ConfigWriteFailed`] if writing fails.
    pub fn save(&self) -> LockboxResult<()> {
        let path = self.resolved_file()?;

        let contents = serde_yaml::to_string(self)
            .map_err(|e| LockboxError::ConfigWriteFailed(format!("serialization: {}", e)))?;

        write_atomic(path, contents.as_bytes())
            .map_err(|e| LockboxError::ConfigWriteFailed(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Only YAML configuration files are supported
fn config_type(path: &Path) -> LockboxResult<&'static str> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok("yaml"),
        _ => Err(LockboxError::ConfigUnresolved(format!(
            "config type could not be determined for {}",
            path.display()
        ))),
    }
}

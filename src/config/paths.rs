//! Path management for Lockbox
//!
//! ## Path Resolution Order
//!
//! 1. `LOCKBOX_HOME` environment variable (if set)
//! 2. The platform configuration directory (`~/.config/lockbox` on Linux,
//!    `~/Library/Application Support/lockbox` on macOS, `%APPDATA%\lockbox` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::LockboxError;

/// Environment variable overriding the base directory
pub const HOME_ENV_VAR: &str = "LOCKBOX_HOME";

/// Manages all paths used by Lockbox
#[derive(Debug, Clone)]
pub struct LockboxPaths {
    /// Base directory for all Lockbox files
    base_dir: PathBuf,
}

impl LockboxPaths {
    /// Create a new LockboxPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, LockboxError> {
        let base_dir = match std::env::var(HOME_ENV_VAR) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create LockboxPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (<base>/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.yaml")
    }

    /// Get the default path to the database file
    pub fn database_file(&self) -> PathBuf {
        self.data_dir().join("lockbox.db")
    }
}

fn resolve_default_path() -> Result<PathBuf, LockboxError> {
    ProjectDirs::from("", "", "lockbox")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| LockboxError::Config("Could not determine home directory".into()))
}

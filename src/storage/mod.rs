//! Storage layer for Lockbox
//!
//! The database file is JSON written atomically. This crate only owns its key
//! header: the Argon2 salt and a verifier record encrypted under the master
//! key. Opening the verifier is how a freshly derived key is validated.

pub mod file_io;

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crypto::{decrypt, encrypt, Enclave, EncryptedData, SALT_SIZE};
use crate::error::{LockboxError, LockboxResult};

pub use file_io::{read_json, write_atomic, write_json_atomic};

/// Known plaintext sealed into the verifier record
const VERIFIER_PLAINTEXT: &[u8] = b"lockbox_verify";

/// Current key header layout
const HEADER_VERSION: u32 = 1;

/// Salt and verifier for the master key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHeader {
    /// Header layout version
    pub version: u32,
    /// When the master key was (re)established
    pub created_at: DateTime<Utc>,
    /// Argon2 salt (base64 encoded)
    pub salt: String,
    /// `VERIFIER_PLAINTEXT` encrypted with the master key
    pub verifier: EncryptedData,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DatabaseFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<KeyHeader>,
}

/// Handle on the database file
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    header: Option<KeyHeader>,
}

impl Store {
    /// Open the database at `path`; a missing file is an empty database
    pub fn open(path: impl Into<PathBuf>) -> LockboxResult<Self> {
        let path = path.into();
        let file: DatabaseFile = read_json(&path)?.unwrap_or_default();

        if let Some(header) = &file.header {
            if header.version != HEADER_VERSION {
                return Err(LockboxError::Storage(format!(
                    "Unsupported key header version: {}",
                    header.version
                )));
            }
        }

        debug!(path = %path.display(), initialized = file.header.is_some(), "database opened");

        Ok(Self {
            path,
            header: file.header,
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a master key has been established for this database
    pub fn is_initialized(&self) -> bool {
        self.header.is_some()
    }

    /// The current key header, if any
    pub fn header(&self) -> Option<&KeyHeader> {
        self.header.as_ref()
    }

    /// Decode the stored Argon2 salt
    pub fn salt(&self) -> LockboxResult<Vec<u8>> {
        let header = self.header.as_ref().ok_or_else(|| {
            LockboxError::Storage(format!(
                "Database {} has no key header",
                self.path.display()
            ))
        })?;

        let salt = STANDARD
            .decode(&header.salt)
            .map_err(|e| LockboxError::Storage(format!("Invalid salt encoding: {}", e)))?;

        if salt.len() != SALT_SIZE {
            return Err(LockboxError::Storage(format!(
                "Invalid salt size: expected {}, got {}",
                SALT_SIZE,
                salt.len()
            )));
        }

        Ok(salt)
    }

    /// Write a new key header for `key`, returning the one it replaced
    ///
    /// Pass the returned value to [`restore`](Self::restore) to undo.
    pub fn initialize(&mut self, key: &Enclave, salt: &[u8]) -> LockboxResult<Option<KeyHeader>> {
        let header = KeyHeader {
            version: HEADER_VERSION,
            created_at: Utc::now(),
            salt: STANDARD.encode(salt),
            verifier: encrypt(VERIFIER_PLAINTEXT, key)?,
        };

        let previous = self.header.clone();
        self.write(Some(header))?;

        info!(path = %self.path.display(), "master key header written");
        Ok(previous)
    }

    /// Put back a header returned by [`initialize`](Self::initialize)
    pub fn restore(&mut self, previous: Option<KeyHeader>) -> LockboxResult<()> {
        match previous {
            Some(header) => self.write(Some(header)),
            None => {
                if self.path.exists() {
                    std::fs::remove_file(&self.path).map_err(|e| {
                        LockboxError::Storage(format!(
                            "Failed to remove {}: {}",
                            self.path.display(),
                            e
                        ))
                    })?;
                }
                self.header = None;
                Ok(())
            }
        }
    }

    /// Check that `key` opens the verifier record
    ///
    /// Any failure is reported as [`LockboxError::AuthenticationFailed`].
    pub fn verify(&self, key: &Enclave) -> LockboxResult<()> {
        let header = self.header.as_ref().ok_or_else(|| {
            LockboxError::Storage(format!(
                "Database {} has no key header",
                self.path.display()
            ))
        })?;

        match decrypt(&header.verifier, key) {
            Ok(plaintext) if plaintext == VERIFIER_PLAINTEXT => Ok(()),
            _ => Err(LockboxError::AuthenticationFailed),
        }
    }

    fn write(&mut self, header: Option<KeyHeader>) -> LockboxResult<()> {
        let file = DatabaseFile { header };
        write_json_atomic(&self.path, &file)?;
        self.header = file.header;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(byte: u8) -> Enclave {
        Enclave::new(vec![byte; 32]).unwrap()
    }

    #[test]
    fn test_open_missing_database() {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open(temp_dir.path().join("lockbox.db")).unwrap();
        assert!(!store.is_initialized());
        assert!(store.salt().is_err());
    }

    #[test]
    fn test_initialize_and_verify() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("lockbox.db");

        let mut store = Store::open(&path).unwrap();
        let previous = store.initialize(&key(1), &[9u8; SALT_SIZE]).unwrap();
        assert!(previous.is_none());

        let reopened = Store::open(&path).unwrap();
        assert!(reopened.is_initialized());
        assert_eq!(reopened.salt().unwrap(), vec![9u8; SALT_SIZE]);
        reopened.verify(&key(1)).unwrap();
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::open(temp_dir.path().join("lockbox.db")).unwrap();
        store.initialize(&key(1), &[0u8; SALT_SIZE]).unwrap();

        let err = store.verify(&key(2)).unwrap_err();
        assert!(err.is_authentication_failure());
    }

    #[test]
    fn test_restore_previous_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lockbox.db");
        let mut store = Store::open(&path).unwrap();
        store.initialize(&key(1), &[1u8; SALT_SIZE]).unwrap();

        let previous = store.initialize(&key(2), &[2u8; SALT_SIZE]).unwrap();
        store.restore(previous).unwrap();

        let reopened = Store::open(&path).unwrap();
        reopened.verify(&key(1)).unwrap();
        assert_eq!(reopened.salt().unwrap(), vec![1u8; SALT_SIZE]);
    }

    #[test]
    fn test_restore_to_empty_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lockbox.db");
        let mut store = Store::open(&path).unwrap();

        let previous = store.initialize(&key(1), &[1u8; SALT_SIZE]).unwrap();
        store.restore(previous).unwrap();

        assert!(!path.exists());
        assert!(!store.is_initialized());
    }

    #[test]
    fn test_unsupported_header_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lockbox.db");
        let mut store = Store::open(&path).unwrap();
        store.initialize(&key(1), &[1u8; SALT_SIZE]).unwrap();

        let mut raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        raw["header"]["version"] = serde_json::json!(7);
        std::fs::write(&path, raw.to_string()).unwrap();

        assert!(matches!(Store::open(&path), Err(LockboxError::Storage(_))));
    }
}

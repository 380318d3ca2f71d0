//! Custom error types for Lockbox
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Every variant is terminal for the current
//! command: nothing is retried, the CLI prints the message and exits non-zero.

use thiserror::Error;

/// The main error type for Lockbox operations
#[derive(Error, Debug)]
pub enum LockboxError {
    /// A numeric prompt answer did not parse, or an Argon2 parameter is degenerate
    #[error("Invalid {field}: {value:?}")]
    InvalidParameter { field: &'static str, value: String },

    /// No writable, type-resolvable configuration file is bound to the process
    #[error("Configuration file could not be resolved: {0}")]
    ConfigUnresolved(String),

    /// The key file could not be read
    #[error("Failed to read key file {path}: {reason}")]
    KeyfileUnreadable { path: String, reason: String },

    /// The password enclave could not be opened, or the password is empty
    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    /// The two password entries given during setup differ
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Writing the configuration file failed
    #[error("Failed to write configuration: {0}")]
    ConfigWriteFailed(String),

    /// The derived key does not open the stored verifier
    #[error("Authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// An enclave failed its integrity check or was already destroyed
    #[error("Enclave corrupted: {0}")]
    EnclaveCorrupted(String),

    /// Configuration-related errors (parsing, inconsistent state)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Storage engine errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encryption errors
    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl LockboxError {
    /// Create an invalid parameter error for a named field
    pub fn invalid_parameter(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            value: value.into(),
        }
    }

    /// Check if this is an authentication failure
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }

    /// Check if this error was caused by a missing or unusable config file
    pub fn is_config_unresolved(&self) -> bool {
        matches!(self, Self::ConfigUnresolved(_))
    }
}

impl From<std::io::Error> for LockboxError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for Lockbox operations
pub type LockboxResult<T> = Result<T, LockboxError>;

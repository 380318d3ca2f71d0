//! Lockbox - Local secrets manager
//!
//! This library provides the master-key layer of Lockbox: every command
//! re-derives the encryption key from the master password (optionally
//! strengthened by a key file) with Argon2id and validates it against the
//! database before any stored data is touched.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `auth`: Parameter negotiation, key files and the authentication gate
//! - `cli`: Command handlers
//! - `config`: Path resolution and the YAML configuration document
//! - `crypto`: Sealed enclaves, key derivation and AES-256-GCM
//! - `error`: Custom error types
//! - `storage`: Database key header and atomic file I/O
//!
//! # Example
//!
//! ```rust,ignore
//! use lockbox::auth::{login, Prompt};
//! use lockbox::config::{Config, LockboxPaths};
//! use lockbox::storage::Store;
//!
//! let paths = LockboxPaths::new()?;
//! let mut config = Config::load(paths.config_file())?;
//! let mut store = Store::open(config.database_path(&paths))?;
//! let session = login(&mut config, &mut store, &mut Prompt::stdio())?;
//! let record = session.encrypt(b"secret")?;
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

pub use error::LockboxError;

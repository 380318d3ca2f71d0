//! Configuration module for Lockbox
//!
//! This module provides configuration management including:
//! - Home directory resolution
//! - The YAML configuration document (`auth`, `keyfile`, `database`)

pub mod paths;
pub mod settings;

pub use paths::LockboxPaths;
pub use settings::{AuthSettings, Config, DatabaseSettings, KeyfileSettings};

//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the authentication layer.

pub mod auth;

pub use auth::{handle_config, handle_keyfile, handle_login, handle_setup, Workspace};

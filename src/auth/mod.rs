//! Master-key authentication
//!
//! Every command that touches stored data goes through [`login`], which
//! either runs first-time setup or validates the master password (plus an
//! optional key file) and returns an [`AuthSession`].

pub mod gate;
pub mod keyfile;
pub mod params;
pub mod prompt;
pub mod session;

pub use gate::{change_keyfile, login, setup};
pub use keyfile::{ask_keyfile, choose_keyfile, combine_keys, KEYFILE_SIZE};
pub use params::ask_parameters;
pub use prompt::Prompt;
pub use session::AuthSession;

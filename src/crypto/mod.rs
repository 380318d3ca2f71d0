//! Cryptographic functions for Lockbox
//!
//! Sealed in-memory enclaves, Argon2id master-key derivation and
//! AES-256-GCM encryption under the derived key.

pub mod enclave;
pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use enclave::Enclave;
pub use encryption::{decrypt, encrypt, EncryptedData};
pub use key_derivation::{derive_key, generate_salt, Argon2Params, KEY_SIZE, SALT_SIZE};
pub use secure_memory::{LockedBuffer, SecureString};

//! Key derivation using Argon2id
//!
//! Derives the master key from the combined password/key-file secret using
//! Argon2id, a memory-hard key derivation function resistant to GPU/ASIC attacks.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use crate::error::{LockboxError, LockboxResult};

use super::enclave::Enclave;

/// Length of the derived master key (AES-256)
pub const KEY_SIZE: usize = 32;

/// Length of the random salt stored in the database key header
pub const SALT_SIZE: usize = 16;

/// Default time cost
pub const DEFAULT_ITERATIONS: u32 = 1;

/// Default memory cost in KiB (1 GiB)
pub const DEFAULT_MEMORY: u32 = 1_048_576;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Time cost (number of passes)
    pub iterations: u32,
    /// Memory cost in KiB
    pub memory: u32,
    /// Degree of parallelism
    pub threads: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            memory: DEFAULT_MEMORY,
            threads: default_threads(),
        }
    }
}

impl Argon2Params {
    /// Create params with specific values
    pub fn new(iterations: u32, memory: u32, threads: u32) -> Self {
        Self {
            iterations,
            memory,
            threads,
        }
    }

    /// Reject zero values; every field must be at least 1
    pub fn validate(&self) -> LockboxResult<()> {
        for (field, value) in [
            ("iterations", self.iterations),
            ("memory", self.memory),
            ("threads", self.threads),
        ] {
            if value == 0 {
                return Err(LockboxError::invalid_parameter(field, value.to_string()));
            }
        }
        Ok(())
    }
}

/// Number of CPU cores available to the process, at least 1
pub fn default_threads() -> u32 {
    std::thread::available_parallelism()
        .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// Generate a fresh random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the master key from a sealed secret
///
/// The secret is opened only for the duration of the hash; the 32-byte
/// output is sealed into a new enclave before returning.
pub fn derive_key(secret: &Enclave, salt: &[u8], params: &Argon2Params) -> LockboxResult<Enclave> {
    params.validate()?;

    let argon2_params = Params::new(params.memory, params.iterations, params.threads, Some(KEY_SIZE))
        .map_err(|e| LockboxError::invalid_parameter("argon2 parameters", e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut input = secret
        .open()
        .map_err(|e| LockboxError::InvalidPassword(e.to_string()))?;

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    let derived = argon2.hash_password_into(input.bytes(), salt, key.as_mut());
    input.destroy();

    derived.map_err(|e| LockboxError::Encryption(format!("Key derivation failed: {}", e)))?;

    Enclave::seal(key.as_mut())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> Argon2Params {
        Argon2Params::new(1, 1024, 1)
    }

    fn derive(secret: &[u8], salt: &[u8]) -> Vec<u8> {
        let enclave = Enclave::new(secret.to_vec()).unwrap();
        let key = derive_key(&enclave, salt, &fast_params()).unwrap();
        let bytes = key.open().unwrap().bytes().to_vec();
        bytes
    }

    #[test]
    fn test_default_params() {
        let params = Argon2Params::default();
        assert_eq!(params.iterations, 1);
        assert_eq!(params.memory, 1_048_576);
        assert_eq!(params.threads, default_threads());
        assert!(params.threads >= 1);
    }

    #[test]
    fn test_derive_key_length() {
        assert_eq!(derive(b"test_passphrase", &[1u8; SALT_SIZE]).len(), KEY_SIZE);
    }

    #[test]
    fn test_same_secret_same_key() {
        let salt = generate_salt();
        assert_eq!(derive(b"hunter2", &salt), derive(b"hunter2", &salt));
    }

    #[test]
    fn test_different_secret_different_key() {
        let salt = generate_salt();
        assert_ne!(derive(b"passphrase1", &salt), derive(b"passphrase2", &salt));
    }

    #[test]
    fn test_different_salt_different_key() {
        assert_ne!(
            derive(b"same_passphrase", &[1u8; SALT_SIZE]),
            derive(b"same_passphrase", &[2u8; SALT_SIZE])
        );
    }

    #[test]
    fn test_zero_parameter_rejected() {
        let enclave = Enclave::new(b"x".to_vec()).unwrap();
        let params = Argon2Params::new(1, 0, 1);
        let err = derive_key(&enclave, &[0u8; SALT_SIZE], &params).unwrap_err();
        assert!(matches!(
            err,
            LockboxError::InvalidParameter { field: "memory", .. }
        ));
    }

    #[test]
    fn test_degenerate_memory_rejected() {
        // Argon2 needs at least 8 KiB per lane
        let enclave = Enclave::new(b"x".to_vec()).unwrap();
        let params = Argon2Params::new(1, 8, 4);
        assert!(matches!(
            derive_key(&enclave, &[0u8; SALT_SIZE], &params),
            Err(LockboxError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_destroyed_secret_is_invalid_password() {
        let mut enclave = Enclave::new(b"x".to_vec()).unwrap();
        enclave.destroy();
        assert!(matches!(
            derive_key(&enclave, &[0u8; SALT_SIZE], &fast_params()),
            Err(LockboxError::InvalidPassword(_))
        ));
    }

    #[test]
    fn test_salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}

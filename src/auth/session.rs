//! The authenticated session handed to commands

use std::fmt;

use crate::crypto::{decrypt, encrypt, Argon2Params, Enclave, EncryptedData};
use crate::error::LockboxResult;

/// Validated master key for one command invocation
///
/// Owned by the dispatch layer and passed by reference to anything that
/// needs the key. Dropping the session destroys the key enclave.
pub struct AuthSession {
    params: Argon2Params,
    master_key: Enclave,
}

impl AuthSession {
    pub(crate) fn new(params: Argon2Params, master_key: Enclave) -> Self {
        Self { params, master_key }
    }

    /// Parameters the key was derived with
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    /// The sealed master key
    pub fn master_key(&self) -> &Enclave {
        &self.master_key
    }

    /// Encrypt a record under the master key
    pub fn encrypt(&self, plaintext: &[u8]) -> LockboxResult<EncryptedData> {
        encrypt(plaintext, &self.master_key)
    }

    /// Decrypt a record encrypted under the master key
    pub fn decrypt(&self, encrypted: &EncryptedData) -> LockboxResult<Vec<u8>> {
        decrypt(encrypted, &self.master_key)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("params", &self.params)
            .field("master_key", &"[REDACTED]")
            .finish()
    }
}

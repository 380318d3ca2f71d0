//! Sealed in-memory containers for secret bytes
//!
//! An [`Enclave`] keeps its contents encrypted with AES-256-GCM under a random
//! key generated once per process. Plaintext only exists inside the
//! [`LockedBuffer`] returned by [`Enclave::open`], which wipes itself when
//! destroyed or dropped.

use std::fmt;
use std::sync::OnceLock;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroize;

use crate::error::{LockboxError, LockboxResult};

use super::secure_memory::LockedBuffer;

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
const TAG_SIZE: usize = 16;

/// Process-wide sealing cipher, keyed on first use
static COFFER: OnceLock<Aes256Gcm> = OnceLock::new();

fn coffer() -> &'static Aes256Gcm {
    COFFER.get_or_init(|| {
        let mut key = Aes256Gcm::generate_key(OsRng);
        let cipher = Aes256Gcm::new(&key);
        key.as_mut_slice().zeroize();
        cipher
    })
}

enum State {
    Sealed {
        nonce: [u8; NONCE_SIZE],
        ciphertext: Vec<u8>,
    },
    Destroyed,
}

/// An encrypted-at-rest container for passwords, combined secrets and keys
///
/// Enclaves are deliberately not `Clone`: each one has exactly one owner,
/// and dropping it destroys the sealed bytes.
pub struct Enclave {
    state: State,
}

impl Enclave {
    /// Seal the given bytes and wipe the caller's buffer
    ///
    /// The source slice is zeroed whether or not sealing succeeds.
    pub fn seal(plaintext: &mut [u8]) -> LockboxResult<Self> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let sealed = coffer().encrypt(Nonce::from_slice(&nonce), &*plaintext);
        plaintext.zeroize();

        let ciphertext = sealed
            .map_err(|e| LockboxError::Encryption(format!("Failed to seal enclave: {}", e)))?;

        Ok(Self {
            state: State::Sealed { nonce, ciphertext },
        })
    }

    /// Seal the contents of a guarded buffer, destroying the buffer
    pub fn from_buffer(mut buffer: LockedBuffer) -> LockboxResult<Self> {
        let enclave = Self::seal(buffer.bytes_mut());
        buffer.destroy();
        enclave
    }

    /// Seal owned bytes
    pub fn new(bytes: Vec<u8>) -> LockboxResult<Self> {
        Self::from_buffer(LockedBuffer::new(bytes))
    }

    /// Decrypt into a short-lived guarded buffer
    ///
    /// Fails with [`LockboxError::EnclaveCorrupted`] if the ciphertext does not
    /// authenticate or the enclave was destroyed.
    pub fn open(&self) -> LockboxResult<LockedBuffer> {
        match &self.state {
            State::Destroyed => Err(LockboxError::EnclaveCorrupted(
                "enclave has been destroyed".to_string(),
            )),
            State::Sealed { nonce, ciphertext } => coffer()
                .decrypt(Nonce::from_slice(nonce), ciphertext.as_ref())
                .map(LockedBuffer::new)
                .map_err(|_| {
                    LockboxError::EnclaveCorrupted("integrity check failed".to_string())
                }),
        }
    }

    /// Number of plaintext bytes held (0 once destroyed)
    pub fn size(&self) -> usize {
        match &self.state {
            State::Sealed { ciphertext, .. } => ciphertext.len().saturating_sub(TAG_SIZE),
            State::Destroyed => 0,
        }
    }

    /// Whether [`destroy`](Self::destroy) has run
    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, State::Destroyed)
    }

    /// Wipe the sealed bytes; safe to call any number of times
    pub fn destroy(&mut self) {
        if let State::Sealed { nonce, ciphertext } = &mut self.state {
            nonce.zeroize();
            ciphertext.zeroize();
        }
        self.state = State::Destroyed;
    }

    #[cfg(test)]
    pub(crate) fn tamper(&mut self) {
        if let State::Sealed { ciphertext, .. } = &mut self.state {
            if let Some(byte) = ciphertext.first_mut() {
                *byte ^= 0xFF;
            }
        }
    }
}

impl Drop for Enclave {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for Enclave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enclave")
            .field("size", &self.size())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let enclave = Enclave::new(b"hunter2".to_vec()).unwrap();
        let buf = enclave.open().unwrap();
        assert_eq!(buf.bytes(), b"hunter2");
        assert_eq!(enclave.size(), 7);
    }

    #[test]
    fn test_seal_wipes_source() {
        let mut source = b"secret".to_vec();
        let enclave = Enclave::seal(&mut source).unwrap();
        assert_eq!(source, vec![0u8; 6]);
        assert_eq!(enclave.open().unwrap().bytes(), b"secret");
    }

    #[test]
    fn test_open_twice() {
        let enclave = Enclave::new(vec![7u8; 32]).unwrap();
        let first = enclave.open().unwrap();
        let second = enclave.open().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_enclave() {
        let enclave = Enclave::new(Vec::new()).unwrap();
        assert!(enclave.open().unwrap().is_empty());
    }

    #[test]
    fn test_tampered_enclave_is_corrupted() {
        let mut enclave = Enclave::new(b"secret".to_vec()).unwrap();
        enclave.tamper();
        let err = enclave.open().unwrap_err();
        assert!(matches!(err, LockboxError::EnclaveCorrupted(_)));
    }

    #[test]
    fn test_destroyed_enclave_cannot_open() {
        let mut enclave = Enclave::new(b"secret".to_vec()).unwrap();
        enclave.destroy();
        assert!(enclave.is_destroyed());
        assert_eq!(enclave.size(), 0);
        assert!(matches!(
            enclave.open(),
            Err(LockboxError::EnclaveCorrupted(_))
        ));
    }

    #[test]
    fn test_double_destroy() {
        let mut enclave = Enclave::new(b"secret".to_vec()).unwrap();
        enclave.destroy();
        enclave.destroy();
        drop(enclave);
    }

    #[test]
    fn test_debug_redacts() {
        let enclave = Enclave::new(b"secret".to_vec()).unwrap();
        let debug = format!("{:?}", enclave);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("Enclave"));
    }
}

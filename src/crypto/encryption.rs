//! AES-256-GCM encryption/decryption under the master key
//!
//! Used by the storage engine for the key verifier and by collaborators
//! through [`AuthSession`](crate::auth::AuthSession). Each encryption
//! operation generates a unique nonce.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{LockboxError, LockboxResult};

use super::enclave::Enclave;

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// Encrypted data with associated metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    /// The nonce used for this encryption (base64 encoded)
    pub nonce: String,
    /// The encrypted ciphertext with authentication tag (base64 encoded)
    pub ciphertext: String,
    /// Version for future algorithm upgrades
    #[serde(default = "default_version")]
    pub version: u8,
}

fn default_version() -> u8 {
    1
}

impl EncryptedData {
    fn new(nonce: &[u8], ciphertext: &[u8]) -> Self {
        Self {
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
            version: 1,
        }
    }

    fn decode_nonce(&self) -> LockboxResult<Vec<u8>> {
        STANDARD
            .decode(&self.nonce)
            .map_err(|e| LockboxError::Encryption(format!("Invalid nonce encoding: {}", e)))
    }

    fn decode_ciphertext(&self) -> LockboxResult<Vec<u8>> {
        STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| LockboxError::Encryption(format!("Invalid ciphertext encoding: {}", e)))
    }
}

fn cipher_for(key: &Enclave) -> LockboxResult<Aes256Gcm> {
    let mut key_bytes = key.open()?;
    let cipher = Aes256Gcm::new_from_slice(key_bytes.bytes())
        .map_err(|e| LockboxError::Encryption(format!("Failed to create cipher: {}", e)));
    key_bytes.destroy();
    cipher
}

/// Encrypt plaintext data using AES-256-GCM
///
/// Generates a random nonce for each encryption operation.
pub fn encrypt(plaintext: &[u8], key: &Enclave) -> LockboxResult<EncryptedData> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| LockboxError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedData::new(&nonce_bytes, &ciphertext))
}

/// Decrypt ciphertext using AES-256-GCM
pub fn decrypt(encrypted: &EncryptedData, key: &Enclave) -> LockboxResult<Vec<u8>> {
    if encrypted.version != 1 {
        return Err(LockboxError::Encryption(format!(
            "Unsupported encryption version: {}",
            encrypted.version
        )));
    }

    let cipher = cipher_for(key)?;

    let nonce_bytes = encrypted.decode_nonce()?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(LockboxError::Encryption(format!(
            "Invalid nonce size: expected {}, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        )));
    }
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = encrypted.decode_ciphertext()?;

    cipher.decrypt(nonce, ciphertext.as_ref()).map_err(|_| {
        LockboxError::Encryption("Decryption failed: invalid key or corrupted data".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(byte: u8) -> Enclave {
        Enclave::new(vec![byte; 32]).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key(1);
        let plaintext = b"Hello, World!";

        let encrypted = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn test_different_nonces() {
        let key = test_key(1);
        let plaintext = b"Hello, World!";

        let encrypted1 = encrypt(plaintext, &key).unwrap();
        let encrypted2 = encrypt(plaintext, &key).unwrap();

        assert_ne!(encrypted1.nonce, encrypted2.nonce);
        assert_ne!(encrypted1.ciphertext, encrypted2.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt(b"Hello, World!", &test_key(1)).unwrap();
        assert!(decrypt(&encrypted, &test_key(2)).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key(1);
        let mut encrypted = encrypt(b"Hello, World!", &key).unwrap();

        let mut ciphertext = STANDARD.decode(&encrypted.ciphertext).unwrap();
        ciphertext[0] ^= 0xFF;
        encrypted.ciphertext = STANDARD.encode(&ciphertext);

        assert!(decrypt(&encrypted, &key).is_err());
    }

    #[test]
    fn test_unsupported_version() {
        let key = test_key(1);
        let mut encrypted = encrypt(b"data", &key).unwrap();
        encrypted.version = 2;
        assert!(decrypt(&encrypted, &key).is_err());
    }

    #[test]
    fn test_short_key_rejected() {
        let key = Enclave::new(vec![1u8; 16]).unwrap();
        assert!(matches!(
            encrypt(b"data", &key),
            Err(LockboxError::Encryption(_))
        ));
    }
}

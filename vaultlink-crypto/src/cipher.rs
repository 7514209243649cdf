//! Authenticated encryption with ChaCha20-Poly1305.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// ChaCha20-Poly1305 nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// A ciphertext bundled with the nonce it was sealed under.
///
/// The nonce is generated fresh per encryption and is required (together
/// with the key) for decryption; it is not secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with the Poly1305 tag appended.
    pub ciphertext: Vec<u8>,
}

/// Encrypts a payload under the given key with a fresh random nonce.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("seal failed: {e}")))?;

    Ok(EncryptedData { nonce, ciphertext })
}

/// Decrypts a payload. Fails closed: any tag mismatch, truncation or
/// malformed input yields [`CryptoError::Decryption`] and no plaintext.
pub fn decrypt(key: &DerivedKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    cipher
        .decrypt(Nonce::from_slice(&data.nonce), data.ciphertext.as_ref())
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KEY_SIZE;

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; KEY_SIZE])
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let k = key(0x42);
        let sealed = encrypt(&k, b"share payload").unwrap();
        assert_eq!(decrypt(&k, &sealed).unwrap(), b"share payload");
    }

    #[test]
    fn ciphertext_includes_tag_overhead() {
        let sealed = encrypt(&key(1), b"0123456789").unwrap();
        assert_eq!(sealed.ciphertext.len(), 10 + TAG_SIZE);
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = encrypt(&key(1), b"secret").unwrap();
        assert!(matches!(
            decrypt(&key(2), &sealed),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let k = key(1);
        let mut sealed = encrypt(&k, b"secret").unwrap();
        sealed.ciphertext[0] ^= 0xFF;
        assert!(matches!(decrypt(&k, &sealed), Err(CryptoError::Decryption)));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let k = key(1);
        let mut sealed = encrypt(&k, b"secret").unwrap();
        sealed.ciphertext.truncate(4);
        assert!(matches!(decrypt(&k, &sealed), Err(CryptoError::Decryption)));
    }

    #[test]
    fn nonces_are_fresh_per_encryption() {
        let k = key(1);
        let a = encrypt(&k, b"same plaintext").unwrap();
        let b = encrypt(&k, b"same plaintext").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }
}

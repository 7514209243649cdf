//! Key material types and password-based key derivation.

use crate::error::{CryptoError, CryptoResult};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Salt size in bytes (128 bits).
pub const SALT_SIZE: usize = 16;

/// KDF version 1: PBKDF2-HMAC-SHA256, 100_000 iterations.
pub const KDF_VERSION_1: u16 = 1;

const KDF_V1_ITERATIONS: u32 = 100_000;

/// Versioned key derivation parameters.
///
/// The iteration count is a fixed constant per version, never tuned at
/// derivation sites: envelopes record the version they were wrapped under,
/// and a future cost bump is a new version constant plus a re-wrap
/// migration of existing envelopes, not a reinterpretation of old ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub version: u16,
    pub iterations: u32,
}

impl KdfParams {
    /// Returns the current production parameters.
    pub fn v1() -> Self {
        Self {
            version: KDF_VERSION_1,
            iterations: KDF_V1_ITERATIONS,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::v1()
    }
}

/// A random salt for key derivation.
///
/// Every independent derivation context gets a fresh salt; reusing one
/// across the owner wrapping and the share envelope of the same file is a
/// protocol violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh random salt from the OS CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// A derived symmetric key. Zeroized on drop, never serialized.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// A file's data encryption key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct FileKey([u8; KEY_SIZE]);

impl FileKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Reconstructs a file key from a decrypted byte buffer.
    pub fn try_from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FileKey(..)")
    }
}

/// Generates a random file key from the OS CSPRNG.
pub fn generate_file_key() -> FileKey {
    let mut bytes = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);
    FileKey(bytes)
}

/// Derives a symmetric key from a password and salt.
///
/// Deterministic: the same password, salt and parameters always yield the
/// same key. The derivation runs single-threaded and holds no shared state.
pub fn derive_key(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    if params.iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be non-zero".to_string(),
        ));
    }

    let mut out = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), params.iterations, &mut out);
    Ok(DerivedKey(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> KdfParams {
        KdfParams {
            version: KDF_VERSION_1,
            iterations: 1_000,
        }
    }

    #[test]
    fn derive_is_deterministic() {
        let salt = Salt::random();
        let k1 = derive_key("hunter2hunter2", &salt, &fast_params()).unwrap();
        let k2 = derive_key("hunter2hunter2", &salt, &fast_params()).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let k1 = derive_key("hunter2hunter2", &Salt::random(), &fast_params()).unwrap();
        let k2 = derive_key("hunter2hunter2", &Salt::random(), &fast_params()).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn different_passwords_produce_different_keys() {
        let salt = Salt::random();
        let k1 = derive_key("password-one", &salt, &fast_params()).unwrap();
        let k2 = derive_key("password-two", &salt, &fast_params()).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn zero_iterations_rejected() {
        let params = KdfParams {
            version: KDF_VERSION_1,
            iterations: 0,
        };
        assert!(derive_key("pw", &Salt::random(), &params).is_err());
    }

    #[test]
    fn file_key_from_short_slice_rejected() {
        let err = FileKey::try_from_slice(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: 16
            }
        ));
    }
}

//! Password-derived key envelopes.
//!
//! A [`KeyEnvelope`] is a file key sealed under a key derived from a share
//! password (PBKDF2 -> ChaCha20-Poly1305). The salt and nonce needed to
//! re-derive the wrapping key travel with the ciphertext, so the password
//! is the only input needed to open it. The envelope is independent of the
//! owner's own wrapping of the same file key: neither password reveals
//! anything about the other.

use crate::cipher::{decrypt, encrypt, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, FileKey, KdfParams, Salt};
use serde::{Deserialize, Serialize};

/// A file key wrapped under a password-derived envelope key.
///
/// Safe to persist: it contains no secret material recoverable without the
/// share password.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEnvelope {
    /// KDF version the envelope key was derived under. Opening with
    /// mismatched parameters is refused so that an iteration-count bump
    /// goes through an explicit re-wrap migration.
    pub kdf_version: u16,
    /// Salt for the envelope key derivation, fresh per wrap.
    pub salt: Salt,
    /// The sealed file key (nonce + ciphertext + tag).
    pub encrypted: EncryptedData,
}

/// Wraps a file key under a key derived from `password`.
///
/// Generates a fresh salt and nonce on every call; wrapping the same key
/// twice never produces the same envelope.
pub fn wrap_file_key(
    file_key: &FileKey,
    password: &str,
    params: &KdfParams,
) -> CryptoResult<KeyEnvelope> {
    let salt = Salt::random();
    let envelope_key = derive_key(password, &salt, params)?;
    let encrypted = encrypt(&envelope_key, file_key.as_bytes())?;

    Ok(KeyEnvelope {
        kdf_version: params.version,
        salt,
        encrypted,
    })
}

/// Opens an envelope, recovering the file key.
///
/// A wrong password is indistinguishable from a corrupted envelope: both
/// surface as [`CryptoError::Decryption`]. There is no oracle for password
/// correctness beyond success or failure.
pub fn unwrap_file_key(
    envelope: &KeyEnvelope,
    password: &str,
    params: &KdfParams,
) -> CryptoResult<FileKey> {
    if envelope.kdf_version != params.version {
        return Err(CryptoError::KdfVersionMismatch {
            expected: params.version,
            found: envelope.kdf_version,
        });
    }

    let envelope_key = derive_key(password, &envelope.salt, params)?;
    let plaintext = decrypt(&envelope_key, &envelope.encrypted)?;
    FileKey::try_from_slice(&plaintext)
}

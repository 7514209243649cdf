//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in key derivation and envelope operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Covers wrong passwords, tampered ciphertexts, truncated input and
    /// malformed envelopes alike. The causes are deliberately not
    /// distinguishable from one another.
    #[error("decryption failed (wrong password or tampered data)")]
    Decryption,

    #[error("invalid key length: expected {expected}, actual {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("unsupported KDF version {found}, expected {expected}")]
    KdfVersionMismatch { expected: u16, found: u16 },
}

//! Encryption layer for VaultLink.
//!
//! Provides the key-wrapping primitives behind password-protected file
//! sharing:
//! - PBKDF2-HMAC-SHA256 for deriving envelope keys from share passwords
//! - ChaCha20-Poly1305 for authenticated encryption
//! - Secure key material handling with zeroization
//!
//! # Architecture
//!
//! Sharing uses a two-tier key system:
//!
//! 1. **File key**: a random key generated per file at upload time. The
//!    owner keeps their own wrapped copy; this crate never touches it.
//!
//! 2. **Envelope key**: derived from the share password with a fresh salt
//!    each time a share is created or its password rotated. It wraps the
//!    file key into a [`KeyEnvelope`] that is safe to persist.
//!
//! This allows rotating a share password without re-encrypting file data,
//! and keeps the share password independent of the owner's credentials:
//! opening an envelope requires only the password and the envelope itself.

mod cipher;
mod envelope;
mod error;
mod key;

pub use cipher::{decrypt, encrypt, EncryptedData, NONCE_SIZE, TAG_SIZE};
pub use envelope::{unwrap_file_key, wrap_file_key, KeyEnvelope};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, generate_file_key, DerivedKey, FileKey, KdfParams, KDF_VERSION_1, KEY_SIZE,
    SALT_SIZE, Salt,
};

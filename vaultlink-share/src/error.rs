//! Share error types.
//!
//! The anonymous access path deliberately collapses distinct failure causes:
//! an absent, revoked, expired or exhausted share all surface as
//! [`ShareError::NotFound`], and a wrong password as
//! [`ShareError::Unauthorized`], so that callers cannot enumerate tokens or
//! probe share state. Precise causes are logged internally only.

use thiserror::Error;

/// Result type for share operations.
pub type ShareResult<T> = Result<T, ShareError>;

/// Errors surfaced by the share lifecycle manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Token absent, share revoked, expired or download-exhausted.
    #[error("share not found")]
    NotFound,

    /// Password mismatch on a usable share, or an invalid download grant.
    #[error("unauthorized")]
    Unauthorized,

    /// Requester is not on the share's username allow-list.
    #[error("forbidden")]
    Forbidden,

    /// Persistence or crypto-library failure not attributable to caller
    /// input. Never carries salt, nonce or ciphertext detail.
    #[error("internal error: {0}")]
    Internal(String),
}

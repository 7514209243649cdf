//! Share lifecycle manager for VaultLink.
//!
//! Implements the envelope-encrypted sharing protocol:
//! - Share creation: the file key is re-wrapped under a key derived from a
//!   share password and bound to an unguessable access token
//! - Anonymous access: token + password recover the file key, subject to
//!   expiry, download quota and an optional username allow-list
//! - Revocation and password rotation with full envelope re-wrap
//! - Download grants: short-lived Ed25519-signed bearer credentials for the
//!   blob endpoint, carrying no key material
//!
//! Persistence is behind the [`ShareStore`] trait; the bundled
//! [`MemoryShareStore`] backs tests and single-process deployments, while
//! the production SQL store lives with the surrounding application.

pub mod config;
pub mod download;
pub mod error;
pub mod manager;
pub mod store;
pub mod types;

pub use config::ShareConfig;
pub use download::{DownloadAuthorizer, DownloadClaims, DownloadGrant, DownloadSubject};
pub use error::{ShareError, ShareResult};
pub use manager::ShareManager;
pub use store::{MemoryShareStore, ShareStore};
pub use types::{
    CreateShareRequest, FileShare, OwnerWrappedKey, PasswordRotation, ShareMetadata, ShareState,
    ShareUpdate,
};

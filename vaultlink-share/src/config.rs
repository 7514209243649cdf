//! Share subsystem configuration.
//!
//! Constructed explicitly by the embedding application and injected at
//! startup. There is no lazy global state and nothing here reads the
//! environment.

use serde::{Deserialize, Serialize};
use vaultlink_crypto::KdfParams;

/// Configuration for the share lifecycle manager.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Key derivation parameters for share envelopes. Versioned; changing
    /// the iteration count requires a re-wrap migration of existing shares.
    pub kdf: KdfParams,

    /// Random bytes per share token (hex-encoded to twice this length).
    pub token_bytes: usize,

    /// Attempts to generate a collision-free token before giving up.
    pub max_token_retries: u32,

    /// Lifetime of a download grant in seconds. Minutes-scale by design,
    /// independent of the share's own expiry.
    pub download_grant_ttl_secs: i64,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::v1(),
            token_bytes: 32,
            max_token_retries: 8,
            download_grant_ttl_secs: 600, // 10 minutes
        }
    }
}

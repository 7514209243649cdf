//! Shared types for the share lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vaultlink_crypto::{FileKey, KeyEnvelope, NONCE_SIZE, SALT_SIZE};

/// The file key as wrapped under the owner's own context by the upload
/// flow. Carried on the share record for the owner's benefit; this
/// subsystem persists it opaquely and never opens it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerWrappedKey {
    pub ciphertext: Vec<u8>,
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
}

/// A password-protected share of a single user file.
///
/// `share_token` is the public lookup key for anonymous access; the record
/// id never leaves the owning application. Expiry and exhaustion are derived
/// predicates, never stored states.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileShare {
    pub id: Uuid,
    pub user_file_id: Uuid,
    /// Unguessable, URL-safe, unique. 32 random bytes, hex-encoded.
    pub share_token: String,
    /// Owner-context wrapping, produced by the upload flow.
    pub owner_key: OwnerWrappedKey,
    /// The file key re-wrapped under the share password.
    pub envelope: KeyEnvelope,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` means unlimited.
    pub max_downloads: Option<u32>,
    /// Monotonically increasing, incremented exactly once per successful
    /// access, never decremented.
    pub download_count: u32,
    /// Empty means anyone holding token + password.
    pub allowed_usernames: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived share state, evaluated at access time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareState {
    Active,
    Expired,
    Exhausted,
}

impl FileShare {
    /// Evaluates the state predicate at `now`. Expiry takes precedence
    /// over exhaustion.
    pub fn state_at(&self, now: DateTime<Utc>) -> ShareState {
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return ShareState::Expired;
            }
        }
        if let Some(max) = self.max_downloads {
            if self.download_count >= max {
                return ShareState::Exhausted;
            }
        }
        ShareState::Active
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == ShareState::Active
    }

    /// Remaining downloads; `None` means unlimited.
    pub fn remaining_downloads(&self) -> Option<u32> {
        self.max_downloads
            .map(|max| max.saturating_sub(self.download_count))
    }
}

/// Request to create a share.
///
/// `file_key` is supplied already decrypted by the owner key context; this
/// subsystem never performs the owner-side unwrap.
#[derive(Clone, Debug)]
pub struct CreateShareRequest {
    pub user_file_id: Uuid,
    pub file_key: FileKey,
    pub owner_key: OwnerWrappedKey,
    pub password: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_downloads: Option<u32>,
    pub allowed_usernames: Vec<String>,
}

/// A password change for an existing share. Requires the file key again
/// because rotation fully re-wraps the envelope with a fresh salt and
/// nonce; the old envelope is discarded, never patched.
#[derive(Clone, Debug)]
pub struct PasswordRotation {
    pub password: String,
    pub file_key: FileKey,
}

/// Partial update of a share. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct ShareUpdate {
    pub password: Option<PasswordRotation>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_downloads: Option<u32>,
    pub allowed_usernames: Option<Vec<String>>,
}

/// Public, password-free projection of a usable share.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareMetadata {
    pub share_token: String,
    pub user_file_id: Uuid,
    pub max_downloads: Option<u32>,
    pub download_count: u32,
    pub remaining_downloads: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ShareMetadata {
    pub(crate) fn from_share(share: &FileShare) -> Self {
        Self {
            share_token: share.share_token.clone(),
            user_file_id: share.user_file_id,
            max_downloads: share.max_downloads,
            download_count: share.download_count,
            remaining_downloads: share.remaining_downloads(),
            expires_at: share.expires_at,
            created_at: share.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vaultlink_crypto::{generate_file_key, wrap_file_key, KdfParams, KDF_VERSION_1};

    fn share(
        expires_at: Option<DateTime<Utc>>,
        max_downloads: Option<u32>,
        download_count: u32,
    ) -> FileShare {
        let params = KdfParams {
            version: KDF_VERSION_1,
            iterations: 10,
        };
        let now = Utc::now();
        FileShare {
            id: Uuid::new_v4(),
            user_file_id: Uuid::new_v4(),
            share_token: "ab".repeat(32),
            owner_key: OwnerWrappedKey {
                ciphertext: vec![0u8; 48],
                salt: [0u8; SALT_SIZE],
                nonce: [0u8; NONCE_SIZE],
            },
            envelope: wrap_file_key(&generate_file_key(), "pw", &params).unwrap(),
            expires_at,
            max_downloads,
            download_count,
            allowed_usernames: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn unlimited_share_is_active() {
        let s = share(None, None, 1_000_000);
        assert_eq!(s.state_at(Utc::now()), ShareState::Active);
        assert_eq!(s.remaining_downloads(), None);
    }

    #[test]
    fn expiry_boundary() {
        let now = Utc::now();
        let expired = share(Some(now - Duration::seconds(1)), None, 0);
        let live = share(Some(now + Duration::hours(1)), None, 0);
        assert_eq!(expired.state_at(now), ShareState::Expired);
        assert!(!expired.is_usable_at(now));
        assert_eq!(live.state_at(now), ShareState::Active);
        assert!(live.is_usable_at(now));
    }

    #[test]
    fn quota_boundary() {
        let now = Utc::now();
        assert_eq!(share(None, Some(2), 1).state_at(now), ShareState::Active);
        assert_eq!(share(None, Some(2), 2).state_at(now), ShareState::Exhausted);
        // Quota reduced below the counter after the fact
        assert_eq!(share(None, Some(1), 5).state_at(now), ShareState::Exhausted);
    }

    #[test]
    fn expiry_takes_precedence_over_exhaustion() {
        let now = Utc::now();
        let s = share(Some(now - Duration::seconds(1)), Some(1), 1);
        assert_eq!(s.state_at(now), ShareState::Expired);
    }

    #[test]
    fn remaining_downloads_saturates() {
        assert_eq!(share(None, Some(3), 1).remaining_downloads(), Some(2));
        assert_eq!(share(None, Some(1), 5).remaining_downloads(), Some(0));
    }
}

//! Share lifecycle: creation, rotation, anonymous access, revocation.
//!
//! Orchestrates the sharing protocol over a [`ShareStore`] and the crypto
//! envelope primitives. All failures on the anonymous access path are
//! logged with their precise cause and surfaced with the merged,
//! enumeration-resistant taxonomy from [`crate::error`].

use crate::config::ShareConfig;
use crate::error::{ShareError, ShareResult};
use crate::store::ShareStore;
use crate::types::{CreateShareRequest, FileShare, ShareMetadata, ShareState, ShareUpdate};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vaultlink_crypto::{unwrap_file_key, wrap_file_key, FileKey, KeyEnvelope};

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";
const MIN_PASSWORD_LEN: usize = 12;

/// Orchestrates the share lifecycle.
pub struct ShareManager<S> {
    store: S,
    config: ShareConfig,
}

impl<S: ShareStore> ShareManager<S> {
    pub fn new(store: S, config: ShareConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Creates a password-protected share for a file.
    ///
    /// The caller (the owning application) has already verified file
    /// ownership and supplied the decrypted file key. The key is wrapped
    /// into a fresh envelope and bound to a newly generated token;
    /// generation retries on the (negligible) chance of a token collision.
    pub async fn create_share(&self, req: CreateShareRequest) -> ShareResult<FileShare> {
        validate_share_password(&req.password)?;

        if let Some(max) = req.max_downloads {
            if max == 0 {
                return Err(ShareError::InvalidArgument(
                    "max_downloads must be at least 1".to_string(),
                ));
            }
        }
        if let Some(expires_at) = req.expires_at {
            if expires_at <= Utc::now() {
                return Err(ShareError::InvalidArgument(
                    "expires_at must be in the future".to_string(),
                ));
            }
        }

        let envelope = self
            .wrap_envelope(req.file_key.clone(), req.password.clone())
            .await?;

        for _ in 0..self.config.max_token_retries {
            let now = Utc::now();
            let share = FileShare {
                id: Uuid::new_v4(),
                user_file_id: req.user_file_id,
                share_token: self.generate_token(),
                owner_key: req.owner_key.clone(),
                envelope: envelope.clone(),
                expires_at: req.expires_at,
                max_downloads: req.max_downloads,
                download_count: 0,
                allowed_usernames: req.allowed_usernames.clone(),
                created_at: now,
                updated_at: now,
            };

            if self.store.insert(share.clone()).await? {
                info!(share_id = %share.id, user_file_id = %share.user_file_id, "created share");
                return Ok(share);
            }
            warn!(user_file_id = %req.user_file_id, "share token collision, retrying");
        }

        Err(ShareError::Internal(
            "failed to generate a unique share token".to_string(),
        ))
    }

    /// Applies a partial update to a share.
    ///
    /// A password change re-wraps the envelope in full (fresh salt and
    /// nonce); the old envelope key stays valid only for the discarded
    /// ciphertext. Reducing `max_downloads` below the current counter is
    /// accepted and makes the share immediately exhausted. A past
    /// `expires_at` is likewise accepted here (immediate expiry), unlike
    /// on creation.
    pub async fn update_share(&self, share_id: Uuid, update: ShareUpdate) -> ShareResult<FileShare> {
        let mut share = self
            .store
            .get(share_id)
            .await?
            .ok_or(ShareError::NotFound)?;

        if let Some(max) = update.max_downloads {
            if max == 0 {
                return Err(ShareError::InvalidArgument(
                    "max_downloads must be at least 1".to_string(),
                ));
            }
            share.max_downloads = Some(max);
        }
        if let Some(expires_at) = update.expires_at {
            share.expires_at = Some(expires_at);
        }
        if let Some(allowed) = update.allowed_usernames {
            share.allowed_usernames = allowed;
        }
        if let Some(rotation) = update.password {
            validate_share_password(&rotation.password)?;
            share.envelope = self
                .wrap_envelope(rotation.file_key, rotation.password)
                .await?;
            info!(share_id = %share.id, "share password rotated, envelope re-wrapped");
        }

        share.updated_at = Utc::now();
        self.store.update(share.clone()).await?;
        Ok(share)
    }

    /// Recovers the file key for an anonymous recipient.
    ///
    /// The protocol, in order: token lookup, usability predicate,
    /// allow-list, envelope unwrap, then the atomic quota increment. The
    /// increment commits only after a successful unwrap, and the key is
    /// withheld if the increment loses the quota race.
    pub async fn access_share(
        &self,
        token: &str,
        password: &str,
        requesting_username: Option<&str>,
    ) -> ShareResult<FileKey> {
        let share = match self.store.get_by_token(token).await? {
            Some(share) => share,
            None => {
                debug!("share access denied: unknown token");
                return Err(ShareError::NotFound);
            }
        };

        match share.state_at(Utc::now()) {
            ShareState::Active => {}
            state => {
                warn!(share_id = %share.id, ?state, "share access denied");
                return Err(ShareError::NotFound);
            }
        }

        if !share.allowed_usernames.is_empty() {
            let allowed = requesting_username
                .map(|name| share.allowed_usernames.iter().any(|u| u == name))
                .unwrap_or(false);
            if !allowed {
                warn!(share_id = %share.id, "share access denied: username not on allow-list");
                return Err(ShareError::Forbidden);
            }
        }

        let file_key = match self
            .unwrap_envelope(share.envelope.clone(), password.to_string())
            .await?
        {
            Ok(key) => key,
            Err(err) => {
                warn!(share_id = %share.id, %err, "share access denied: envelope unwrap failed");
                return Err(ShareError::Unauthorized);
            }
        };

        if !self.store.conditional_increment(share.id).await? {
            warn!(share_id = %share.id, "share access denied: quota exhausted during increment");
            return Err(ShareError::NotFound);
        }

        info!(share_id = %share.id, "share accessed");
        Ok(file_key)
    }

    /// Revokes a share. Terminal: the record is deleted and its token is
    /// never reissued.
    pub async fn revoke_share(&self, share_id: Uuid) -> ShareResult<()> {
        if !self.store.delete(share_id).await? {
            return Err(ShareError::NotFound);
        }
        info!(%share_id, "share revoked");
        Ok(())
    }

    /// Public, password-free metadata for a usable share. Unusable shares
    /// are indistinguishable from absent ones.
    pub async fn share_metadata(&self, token: &str) -> ShareResult<ShareMetadata> {
        let share = self
            .store
            .get_by_token(token)
            .await?
            .ok_or(ShareError::NotFound)?;

        match share.state_at(Utc::now()) {
            ShareState::Active => Ok(ShareMetadata::from_share(&share)),
            state => {
                debug!(share_id = %share.id, ?state, "metadata refused for unusable share");
                Err(ShareError::NotFound)
            }
        }
    }

    fn generate_token(&self) -> String {
        let mut bytes = vec![0u8; self.config.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Runs the CPU-bound wrap off the async runtime.
    async fn wrap_envelope(&self, file_key: FileKey, password: String) -> ShareResult<KeyEnvelope> {
        let kdf = self.config.kdf.clone();
        spawn_kdf(move || wrap_file_key(&file_key, &password, &kdf))
            .await?
            .map_err(|e| ShareError::Internal(format!("envelope wrap failed: {e}")))
    }

    /// Runs the CPU-bound unwrap off the async runtime. The crypto error
    /// is returned untranslated for the caller to map at the boundary.
    async fn unwrap_envelope(
        &self,
        envelope: KeyEnvelope,
        password: String,
    ) -> ShareResult<Result<FileKey, vaultlink_crypto::CryptoError>> {
        let kdf = self.config.kdf.clone();
        spawn_kdf(move || unwrap_file_key(&envelope, &password, &kdf)).await
    }
}

async fn spawn_kdf<T, F>(f: F) -> ShareResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ShareError::Internal(format!("key derivation task failed: {e}")))
}

/// Validates share password strength: minimum 12 characters with upper,
/// lower, digit and special-character classes all present.
fn validate_share_password(password: &str) -> ShareResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ShareError::InvalidArgument(format!(
            "share password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ShareError::InvalidArgument(
            "share password must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ShareError::InvalidArgument(
            "share password must contain a lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ShareError::InvalidArgument(
            "share password must contain a digit".to_string(),
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(ShareError::InvalidArgument(
            "share password must contain a special character".to_string(),
        ));
    }
    Ok(())
}

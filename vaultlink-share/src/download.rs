//! Short-lived signed download grants.
//!
//! A successful share access is answered with a grant rather than raw
//! storage access: an Ed25519-signed claims payload the storage layer can
//! verify statelessly. Grants are bearer tokens with a minutes-scale TTL,
//! independent of the share's own expiry.

use crate::config::ShareConfig;
use crate::error::{ShareError, ShareResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Who the grant was issued to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "name")]
pub enum DownloadSubject {
    /// An authenticated user, by username.
    User(String),
    /// An anonymous recipient who presented token + password.
    Anonymous,
}

/// Claims embedded in a download grant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadClaims {
    /// Unique per issued grant, for audit correlation.
    pub grant_id: Uuid,
    pub share_id: Uuid,
    pub user_file_id: Uuid,
    pub subject: DownloadSubject,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// An issued grant: the encoded bearer token plus its decoded claims.
#[derive(Clone, Debug)]
pub struct DownloadGrant {
    /// `base64url(claims-json) "." base64url(signature)`.
    pub token: String,
    pub claims: DownloadClaims,
}

/// Issues and verifies download grants.
///
/// Holds the signing key for the process; verification needs only the
/// public half, so storage nodes can verify without the ability to mint.
pub struct DownloadAuthorizer {
    signing_key: SigningKey,
    ttl: Duration,
}

impl DownloadAuthorizer {
    /// Creates an authorizer with a freshly generated keypair. Grants do
    /// not survive a restart; shares do.
    pub fn new(config: &ShareConfig) -> Self {
        Self::with_signing_key(SigningKey::generate(&mut OsRng), config)
    }

    /// Creates an authorizer with an externally managed signing key, for
    /// deployments where multiple processes must honor each other's grants.
    pub fn with_signing_key(signing_key: SigningKey, config: &ShareConfig) -> Self {
        Self {
            signing_key,
            ttl: Duration::seconds(config.download_grant_ttl_secs),
        }
    }

    /// The public half, for out-of-process verification.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Issues a grant for a file the subject has just been authorized to
    /// download.
    pub fn issue(
        &self,
        share_id: Uuid,
        user_file_id: Uuid,
        subject: DownloadSubject,
    ) -> ShareResult<DownloadGrant> {
        let issued_at = Utc::now();
        let claims = DownloadClaims {
            grant_id: Uuid::new_v4(),
            share_id,
            user_file_id,
            subject,
            issued_at,
            expires_at: issued_at + self.ttl,
        };

        let payload = serde_json::to_vec(&claims)
            .map_err(|e| ShareError::Internal(format!("grant encoding failed: {e}")))?;
        let signature = self.signing_key.sign(&payload);

        let token = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        );
        Ok(DownloadGrant { token, claims })
    }

    /// Verifies a grant token and returns its claims.
    ///
    /// Malformed, forged and expired tokens are all [`ShareError::Unauthorized`];
    /// the holder learns nothing about which check failed.
    pub fn verify(&self, token: &str) -> ShareResult<DownloadClaims> {
        let claims = self.verify_inner(token).ok_or(ShareError::Unauthorized)?;
        if Utc::now() >= claims.expires_at {
            debug!(share_id = %claims.share_id, "download grant expired");
            return Err(ShareError::Unauthorized);
        }
        Ok(claims)
    }

    fn verify_inner(&self, token: &str) -> Option<DownloadClaims> {
        let (payload_b64, sig_b64) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let sig_bytes = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
        let signature = Signature::from_slice(&sig_bytes).ok()?;

        self.signing_key
            .verifying_key()
            .verify(&payload, &signature)
            .ok()?;

        // Deserialize only after the signature checks out.
        serde_json::from_slice(&payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_serde_shape() {
        let user = serde_json::to_value(DownloadSubject::User("alice".to_string())).unwrap();
        assert_eq!(user["kind"], "user");
        assert_eq!(user["name"], "alice");
        let anon = serde_json::to_value(DownloadSubject::Anonymous).unwrap();
        assert_eq!(anon["kind"], "anonymous");
    }
}

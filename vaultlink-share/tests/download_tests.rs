//! Tests for signed download grants: issue/verify, expiry, and rejection
//! of forged or malformed tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pretty_assertions::assert_eq;
use uuid::Uuid;
use vaultlink_share::{DownloadAuthorizer, DownloadSubject, ShareConfig, ShareError};

fn authorizer() -> DownloadAuthorizer {
    DownloadAuthorizer::new(&ShareConfig::default())
}

#[test]
fn issue_then_verify_roundtrip() {
    let auth = authorizer();
    let share_id = Uuid::new_v4();
    let file_id = Uuid::new_v4();

    let grant = auth
        .issue(share_id, file_id, DownloadSubject::User("alice".to_string()))
        .unwrap();

    let claims = auth.verify(&grant.token).unwrap();
    assert_eq!(claims, grant.claims);
    assert_eq!(claims.share_id, share_id);
    assert_eq!(claims.user_file_id, file_id);
    assert_eq!(claims.subject, DownloadSubject::User("alice".to_string()));
    assert!(claims.expires_at > claims.issued_at);
}

#[test]
fn anonymous_subject_roundtrip() {
    let auth = authorizer();
    let grant = auth
        .issue(Uuid::new_v4(), Uuid::new_v4(), DownloadSubject::Anonymous)
        .unwrap();
    let claims = auth.verify(&grant.token).unwrap();
    assert_eq!(claims.subject, DownloadSubject::Anonymous);
}

#[test]
fn expired_grant_is_rejected() {
    let config = ShareConfig {
        download_grant_ttl_secs: -1,
        ..ShareConfig::default()
    };
    let auth = DownloadAuthorizer::new(&config);
    let grant = auth
        .issue(Uuid::new_v4(), Uuid::new_v4(), DownloadSubject::Anonymous)
        .unwrap();

    assert_eq!(auth.verify(&grant.token).unwrap_err(), ShareError::Unauthorized);
}

#[test]
fn tampered_payload_is_rejected() {
    let auth = authorizer();
    let grant = auth
        .issue(Uuid::new_v4(), Uuid::new_v4(), DownloadSubject::Anonymous)
        .unwrap();

    let (payload_b64, sig_b64) = grant.token.split_once('.').unwrap();
    let mut payload = URL_SAFE_NO_PAD.decode(payload_b64).unwrap();
    payload[0] ^= 0x01;
    let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode(&payload), sig_b64);

    assert_eq!(auth.verify(&forged).unwrap_err(), ShareError::Unauthorized);
}

#[test]
fn grant_from_another_keypair_is_rejected() {
    let issuing = authorizer();
    let verifying = authorizer();

    let grant = issuing
        .issue(Uuid::new_v4(), Uuid::new_v4(), DownloadSubject::Anonymous)
        .unwrap();

    assert_eq!(
        verifying.verify(&grant.token).unwrap_err(),
        ShareError::Unauthorized
    );
}

#[test]
fn malformed_tokens_are_rejected() {
    let auth = authorizer();
    for token in [
        "",
        "not-a-grant",
        "missing.signature.extra",
        "!!!.###",
        "YWJj.YWJj", // valid base64, junk content
    ] {
        assert_eq!(
            auth.verify(token).unwrap_err(),
            ShareError::Unauthorized,
            "token {token:?} should be rejected"
        );
    }
}

#[test]
fn verifying_key_is_stable_per_authorizer() {
    let auth = authorizer();
    assert_eq!(auth.verifying_key(), auth.verifying_key());
}

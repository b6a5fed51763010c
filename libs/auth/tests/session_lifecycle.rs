//! End-to-end session lifecycle against live infrastructure
//!
//! Requires a migrated PostgreSQL database and a Redis instance; ignored by
//! default.

use auth::rate_limiter::{RateLimiter, RateLimiterConfig};
use auth::repositories::UserRepository;
use auth::store::SessionStore;
use auth::tokens::{AuthConfig, TokenSigner};
use auth::{AuthError, Authenticator, NewAccount, SessionService};
use common::cache::{RedisConfig, RedisPool};
use common::database::{DatabaseConfig, init_pool};
use std::sync::Arc;
use uuid::Uuid;

async fn live_service() -> SessionService {
    let pool = init_pool(&DatabaseConfig::from_env().expect("db config"))
        .await
        .expect("database");
    let redis = RedisPool::new(&RedisConfig::from_env().expect("redis config")).expect("redis");

    let signer = TokenSigner::new(&AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 3600,
    });

    SessionService::new(
        UserRepository::new(pool),
        SessionStore::new(Arc::new(redis), 3600),
        signer,
        RateLimiter::new(RateLimiterConfig::default()),
    )
}

fn account(email: &str) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
        user_type: "shipper".to_string(),
        terms_accepted: true,
        full_name: Some("Integration Tester".to_string()),
        company_name: None,
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn signup_refresh_and_signout_lifecycle() {
    let service = live_service().await;
    let email = format!("lifecycle-{}@example.com", Uuid::new_v4());

    let (user, pair) = service.sign_up(account(&email)).await.expect("sign up");
    assert_eq!(user.email, email);

    // Access token alone resolves the session
    let lookup = service
        .get_session(Some(&pair.access), None)
        .await
        .expect("lookup");
    assert!(lookup.session.is_some());
    assert!(lookup.refreshed.is_none());

    // Refresh path rotates the pair
    let rotated = service
        .get_session(None, Some(&pair.refresh))
        .await
        .expect("rotate");
    let new_pair = rotated.refreshed.expect("rotated pair");
    assert_ne!(new_pair.refresh, pair.refresh);

    // The replaced refresh token is revoked
    let err = service
        .get_session(None, Some(&pair.refresh))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionRevoked));

    // Password sign-in opens a fresh session
    let (_, signin_pair) = service
        .sign_in_with_password(&email, "secret1")
        .await
        .expect("sign in");

    // Sign-out revokes it
    service
        .sign_out(Some(&signin_pair.refresh))
        .await
        .expect("sign out");
    let err = service
        .get_session(None, Some(&signin_pair.refresh))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionRevoked));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn duplicate_email_is_rejected() {
    let service = live_service().await;
    let email = format!("dup-{}@example.com", Uuid::new_v4());

    service.sign_up(account(&email)).await.expect("first signup");
    let err = service.sign_up(account(&email)).await.unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn wrong_password_is_invalid_credentials() {
    let service = live_service().await;
    let email = format!("creds-{}@example.com", Uuid::new_v4());

    service.sign_up(account(&email)).await.expect("signup");
    let err = service
        .sign_in_with_password(&email, "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

//! Session gate behavior through the full router: classification, redirects,
//! and rotated-cookie propagation.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use auth::cookies::{ACCESS_COOKIE, REFRESH_COOKIE, REMEMBER_COOKIE};
use auth::models::UserRole;

use common::{body_json, set_cookies, test_app, FakeAuthenticator, SessionBehavior};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn public_path_answers_without_a_session_lookup() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::Active);
    let app = test_app(authenticator.clone());

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(authenticator.lookups(), 0);
}

#[tokio::test]
async fn bypass_path_answers_without_a_session_lookup() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::LookupFails);
    let app = test_app(authenticator.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/billing/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"type":"invoice.paid"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(authenticator.lookups(), 0);
    let body = body_json(response).await;
    assert_eq!(body["received"], true);
}

#[tokio::test]
async fn protected_path_without_session_redirects_to_login() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::Absent);
    let app = test_app(authenticator.clone());

    let response = app.oneshot(get("/settings")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?redirect=%2Fsettings"
    );
    assert_eq!(authenticator.lookups(), 1);
}

#[tokio::test]
async fn login_redirect_preserves_the_original_query() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::Absent);
    let app = test_app(authenticator);

    let response = app
        .oneshot(get("/marketplace?tab=my-cargo&price_min=10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?redirect=%2Fmarketplace%3Ftab%3Dmy-cargo%26price_min%3D10"
    );
}

#[tokio::test]
async fn failed_lookup_gates_like_absence_with_an_expiry_hint() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::LookupFails);
    let app = test_app(authenticator);

    let response = app.oneshot(get("/settings")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?redirect=%2Fsettings&error=session_expired"
    );
}

#[tokio::test]
async fn authenticated_user_is_bounced_from_login_to_their_landing() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::Active);
    let app = test_app(authenticator);

    let response = app.oneshot(get("/login")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/marketplace");
}

#[tokio::test]
async fn admin_lands_on_the_dashboard() {
    let authenticator = FakeAuthenticator::new(UserRole::Admin, SessionBehavior::Active);
    let app = test_app(authenticator);

    let response = app.oneshot(get("/signup")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");
}

#[tokio::test]
async fn session_is_attached_to_protected_page_requests() {
    let authenticator = FakeAuthenticator::new(UserRole::Carrier, SessionBehavior::Active);
    let app = test_app(authenticator.clone());

    let response = app.oneshot(get("/dashboard")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(authenticator.lookups(), 1);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "ana@example.com");
}

#[tokio::test]
async fn rotated_tokens_ride_out_as_cookies_on_passthrough() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::ActiveWithRotation);
    let app = test_app(authenticator);

    let response = app.oneshot(get("/marketplace?tab=my-quotes")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=new-access", ACCESS_COOKIE))));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=new-refresh", REFRESH_COOKIE))));
}

#[tokio::test]
async fn rotated_tokens_ride_out_even_on_redirects() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::ActiveWithRotation);
    let app = test_app(authenticator);

    let response = app.oneshot(get("/login")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=new-refresh", REFRESH_COOKIE))));
}

#[tokio::test]
async fn rotation_honors_the_remember_me_marker() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::ActiveWithRotation);
    let app = test_app(authenticator);

    let request = Request::builder()
        .uri("/dashboard")
        .header(header::COOKIE, format!("{}=1", REMEMBER_COOKIE))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let refresh = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{}=", REFRESH_COOKIE)))
        .expect("refresh cookie present");
    assert!(refresh.contains("Max-Age="));
}

#[tokio::test]
async fn rotation_without_remember_me_keeps_a_session_refresh_cookie() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::ActiveWithRotation);
    let app = test_app(authenticator);

    let response = app.oneshot(get("/dashboard")).await.unwrap();

    let refresh = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{}=", REFRESH_COOKIE)))
        .expect("refresh cookie present");
    assert!(!refresh.contains("Max-Age="));
}

#[tokio::test]
async fn unknown_paths_render_public_content() {
    let authenticator = FakeAuthenticator::new(UserRole::Shipper, SessionBehavior::Absent);
    let app = test_app(authenticator.clone());

    let response = app.oneshot(get("/marketplaces")).await.unwrap();

    // Not a protected segment, so no redirect and no lookup; the router
    // answers 404 for the unknown path.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(authenticator.lookups(), 0);
}

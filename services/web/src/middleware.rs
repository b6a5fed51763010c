//! Route classification and the per-request session gate.
//!
//! The gate runs on every request. Public and bypass paths pass through
//! without touching auth state; the rest get exactly one session lookup,
//! whose outcome decides between allowing the request (session attached to
//! request extensions) and redirecting. Token rotation performed by the
//! lookup is propagated as `Set-Cookie` headers on whatever response leaves
//! the gate.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderValue, Request, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use url::form_urlencoded;

use auth::cookies::{self, ACCESS_COOKIE, REFRESH_COOKIE};
use auth::models::{Session, SessionUser, TokenPair, UserRole};

use crate::error::ApiError;
use crate::state::AppState;

const BYPASS_PATHS: &[&str] = &["/api/billing/webhook", "/favicon.ico", "/robots.txt"];
const AUTH_ONLY_PATHS: &[&str] = &["/login", "/signup"];
const PROTECTED_PREFIXES: &[&str] = &["/marketplace", "/settings", "/dashboard"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    AuthOnly,
    Protected,
    Bypass,
}

/// Total over all paths: exact match for bypass and auth-entry paths,
/// path-segment prefix match for protected subtrees, public otherwise.
pub fn classify(path: &str) -> RouteClass {
    if BYPASS_PATHS.contains(&path) {
        return RouteClass::Bypass;
    }
    if AUTH_ONLY_PATHS.contains(&path) {
        return RouteClass::AuthOnly;
    }
    if PROTECTED_PREFIXES
        .iter()
        .any(|prefix| is_segment_prefix(path, prefix))
    {
        return RouteClass::Protected;
    }
    RouteClass::Public
}

// "/marketplace/cargo" matches "/marketplace"; "/marketplaces" does not.
fn is_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Landing page after authentication, by role.
pub fn default_landing(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "/dashboard",
        UserRole::Shipper | UserRole::Carrier => "/marketplace",
    }
}

pub async fn session_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let class = classify(request.uri().path());
    if matches!(class, RouteClass::Bypass | RouteClass::Public) {
        return next.run(request).await;
    }

    let jar = CookieJar::from_headers(request.headers());
    let access = jar.get(ACCESS_COOKIE).map(|c| c.value().to_string());
    let refresh = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let remember = remember_requested(&jar);

    // A lookup failure gates like an absent session; the login redirect
    // carries a hint so the UI can explain why the user was bounced.
    let (session, refreshed, lookup_failed) = match state
        .authenticator
        .get_session(access.as_deref(), refresh.as_deref())
        .await
    {
        Ok(lookup) => (lookup.session, lookup.refreshed, false),
        Err(err) => {
            warn!("Session lookup failed: {}", err);
            (None, None, true)
        }
    };

    let mut response = match (&session, class) {
        (Some(session), RouteClass::AuthOnly) => {
            Redirect::to(default_landing(session.user.role)).into_response()
        }
        (None, RouteClass::Protected) => {
            let target = login_redirect(request.uri(), lookup_failed);
            Redirect::to(&target).into_response()
        }
        _ => {
            let mut request = request;
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
    };

    if let Some(pair) = refreshed {
        attach_session_cookies(&mut response, &pair, remember);
    }
    response
}

pub fn remember_requested(jar: &CookieJar) -> bool {
    jar.get(cookies::REMEMBER_COOKIE)
        .map(|c| c.value() == "1")
        .unwrap_or(false)
}

/// Builds `/login?redirect=<original path+query>[&error=session_expired]`.
fn login_redirect(uri: &Uri, lookup_failed: bool) -> String {
    let original = match uri.query() {
        Some(query) => format!("{}?{}", uri.path(), query),
        None => uri.path().to_string(),
    };
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("redirect", &original);
    if lookup_failed {
        params.append_pair("error", "session_expired");
    }
    format!("/login?{}", params.finish())
}

/// Appends rotated session cookies to an outgoing response.
pub fn attach_session_cookies(response: &mut Response, pair: &TokenPair, remember: bool) {
    for cookie in cookies::session_cookies(pair, remember) {
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

/// Extracts the authenticated user or rejects with 401. Prefers the session
/// placed in extensions by the gate; API routes outside the protected
/// subtrees fall back to a stateless access-token check.
pub struct RequireUser(pub SessionUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(RequireUser(session.user.clone()));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let access = jar.get(ACCESS_COOKIE).ok_or(ApiError::Unauthorized)?;
        let user = state
            .authenticator
            .get_user(access.value())
            .map_err(|_| ApiError::Unauthorized)?;
        Ok(RequireUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_fixed_sets() {
        assert_eq!(classify("/api/billing/webhook"), RouteClass::Bypass);
        assert_eq!(classify("/favicon.ico"), RouteClass::Bypass);
        assert_eq!(classify("/login"), RouteClass::AuthOnly);
        assert_eq!(classify("/signup"), RouteClass::AuthOnly);
        assert_eq!(classify("/marketplace"), RouteClass::Protected);
        assert_eq!(classify("/settings"), RouteClass::Protected);
        assert_eq!(classify("/dashboard"), RouteClass::Protected);
    }

    #[test]
    fn test_classify_everything_else_public() {
        assert_eq!(classify("/"), RouteClass::Public);
        assert_eq!(classify("/about"), RouteClass::Public);
        assert_eq!(classify("/api/auth/login"), RouteClass::Public);
        assert_eq!(classify("/login/reset"), RouteClass::Public);
        // Matching is case-sensitive
        assert_eq!(classify("/LOGIN"), RouteClass::Public);
        assert_eq!(classify("/Marketplace"), RouteClass::Public);
    }

    #[test]
    fn test_protected_prefix_respects_segment_boundaries() {
        assert_eq!(classify("/marketplace/cargo/3"), RouteClass::Protected);
        assert_eq!(classify("/settings/profile"), RouteClass::Protected);
        assert_eq!(classify("/marketplaces"), RouteClass::Public);
        assert_eq!(classify("/settingsfoo"), RouteClass::Public);
    }

    #[test]
    fn test_login_redirect_preserves_path_and_query() {
        let uri: Uri = "/marketplace?tab=my-cargo&price_min=10".parse().unwrap();
        assert_eq!(
            login_redirect(&uri, false),
            "/login?redirect=%2Fmarketplace%3Ftab%3Dmy-cargo%26price_min%3D10"
        );
    }

    #[test]
    fn test_login_redirect_carries_expiry_hint_on_lookup_failure() {
        let uri: Uri = "/settings".parse().unwrap();
        assert_eq!(
            login_redirect(&uri, true),
            "/login?redirect=%2Fsettings&error=session_expired"
        );
    }

    #[test]
    fn test_default_landing_by_role() {
        assert_eq!(default_landing(UserRole::Admin), "/dashboard");
        assert_eq!(default_landing(UserRole::Shipper), "/marketplace");
        assert_eq!(default_landing(UserRole::Carrier), "/marketplace");
    }
}

//! Session cookie construction
//!
//! The web layer attaches these to responses; names are shared with the
//! session gate which reads them back on every request.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::models::TokenPair;

/// Access token cookie (short-lived)
pub const ACCESS_COOKIE: &str = "ft_access_token";
/// Refresh token cookie (long-lived when remember-me is set)
pub const REFRESH_COOKIE: &str = "ft_refresh_token";
/// Remember-me marker; read back at refresh time to decide cookie lifetime
pub const REMEMBER_COOKIE: &str = "ft_remember_me";

fn base(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookies carrying a freshly issued token pair.
///
/// Without remember-me the refresh cookie is a browser-session cookie, so
/// closing the browser ends the session even though the token itself would
/// still verify.
pub fn session_cookies(pair: &TokenPair, remember: bool) -> Vec<Cookie<'static>> {
    let mut access = base(ACCESS_COOKIE, pair.access.clone());
    access.set_max_age(Duration::seconds(pair.access_expires_in as i64));

    let mut refresh = base(REFRESH_COOKIE, pair.refresh.clone());
    if remember {
        refresh.set_max_age(Duration::seconds(pair.refresh_expires_in as i64));
    }

    vec![access, refresh]
}

/// Remember-me marker cookie; not HttpOnly so the login form can preselect it
pub fn remember_cookie(remember: bool) -> Cookie<'static> {
    Cookie::build((REMEMBER_COOKIE, if remember { "1" } else { "0" }))
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

/// Expire all session cookies (sign-out)
pub fn removal_cookies() -> Vec<Cookie<'static>> {
    [ACCESS_COOKIE, REFRESH_COOKIE, REMEMBER_COOKIE]
        .into_iter()
        .map(|name| {
            let mut cookie = Cookie::build((name, "")).path("/").build();
            cookie.set_max_age(Duration::ZERO);
            cookie
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access: "a.b.c".to_string(),
            refresh: "d.e.f".to_string(),
            access_expires_in: 900,
            refresh_expires_in: 604800,
        }
    }

    #[test]
    fn remember_me_pins_refresh_cookie_lifetime() {
        let cookies = session_cookies(&pair(), true);
        let refresh = cookies.iter().find(|c| c.name() == REFRESH_COOKIE).unwrap();
        assert_eq!(refresh.max_age(), Some(Duration::seconds(604800)));
    }

    #[test]
    fn without_remember_me_refresh_is_a_session_cookie() {
        let cookies = session_cookies(&pair(), false);
        let refresh = cookies.iter().find(|c| c.name() == REFRESH_COOKIE).unwrap();
        assert_eq!(refresh.max_age(), None);
    }

    #[test]
    fn removal_cookies_expire_immediately() {
        for cookie in removal_cookies() {
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
            assert!(cookie.value().is_empty());
        }
    }
}

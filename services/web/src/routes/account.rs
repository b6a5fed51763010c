//! Login, signup, and signout flows.
//!
//! These handlers answer browser form posts. Outcomes travel as 303
//! redirects with `error`/`redirect` query params, and session cookies ride
//! on the redirect response.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};
use url::form_urlencoded;

use auth::cookies;
use auth::models::{NewAccount, TokenPair};
use auth::validation;
use auth::AuthError;

use crate::middleware::default_landing;
use crate::state::AppState;

/// Targets the login form must never bounce back to.
const REDIRECT_BLOCKLIST: &[&str] = &["/login", "/signup", "/auth/callback"];

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember: Option<String>,
    pub redirect: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let redirect = sanitize_redirect(form.redirect.as_deref());

    if let Err(message) = validation::validate_email(form.email.trim()) {
        return error_redirect("/login", &message, redirect.as_deref());
    }
    if let Err(message) = validation::validate_password(&form.password) {
        return error_redirect("/login", &message, redirect.as_deref());
    }

    let remember = checkbox_checked(form.remember.as_deref());
    match state
        .authenticator
        .sign_in_with_password(form.email.trim(), &form.password)
        .await
    {
        Ok((user, pair)) => {
            let jar = session_jar(jar, &pair, remember);
            let target = redirect.unwrap_or_else(|| default_landing(user.role).to_string());
            info!("User signed in: {}", user.id);
            (jar, Redirect::to(&target)).into_response()
        }
        Err(AuthError::RateLimited) => error_redirect(
            "/login",
            "Too many login attempts. Please try again later.",
            redirect.as_deref(),
        ),
        Err(AuthError::InvalidCredentials) => {
            error_redirect("/login", "Invalid email or password", redirect.as_deref())
        }
        Err(err) => {
            error!("Sign-in failed: {}", err);
            error_redirect(
                "/login",
                "Something went wrong. Please try again.",
                redirect.as_deref(),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub user_type: String,
    pub terms: Option<String>,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Response {
    let account = NewAccount {
        email: form.email.trim().to_string(),
        password: form.password,
        confirm_password: form.confirm_password,
        user_type: form.user_type,
        terms_accepted: checkbox_checked(form.terms.as_deref()),
        full_name: form.full_name.filter(|v| !v.trim().is_empty()),
        company_name: form.company_name.filter(|v| !v.trim().is_empty()),
    };

    match state.authenticator.sign_up(account).await {
        Ok((user, pair)) => {
            let jar = session_jar(jar, &pair, false);
            info!("User signed up: {}", user.id);
            (jar, Redirect::to(default_landing(user.role))).into_response()
        }
        Err(err @ (AuthError::Validation(_) | AuthError::EmailTaken)) => {
            error_redirect("/signup", &err.first_message(), None)
        }
        Err(err) => {
            error!("Sign-up failed: {}", err);
            error_redirect("/signup", "Something went wrong. Please try again.", None)
        }
    }
}

pub async fn signout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let refresh = jar
        .get(cookies::REFRESH_COOKIE)
        .map(|c| c.value().to_string());
    if let Err(err) = state.authenticator.sign_out(refresh.as_deref()).await {
        warn!("Sign-out cleanup failed: {}", err);
    }

    let mut jar = jar;
    for cookie in cookies::removal_cookies() {
        jar = jar.add(cookie);
    }
    (jar, Redirect::to("/")).into_response()
}

fn checkbox_checked(value: Option<&str>) -> bool {
    matches!(value, Some("on") | Some("true") | Some("1"))
}

fn session_jar(jar: CookieJar, pair: &TokenPair, remember: bool) -> CookieJar {
    let mut jar = jar;
    for cookie in cookies::session_cookies(pair, remember) {
        jar = jar.add(cookie);
    }
    jar.add(cookies::remember_cookie(remember))
}

/// Only same-site path targets survive. Protocol-relative URLs and the auth
/// entry paths are dropped so a successful login cannot loop back to them.
fn sanitize_redirect(raw: Option<&str>) -> Option<String> {
    let candidate = raw?.trim();
    if !candidate.starts_with('/') || candidate.starts_with("//") {
        return None;
    }
    let path = candidate
        .split_once('?')
        .map_or(candidate, |(path, _)| path);
    if REDIRECT_BLOCKLIST.contains(&path) {
        return None;
    }
    Some(candidate.to_string())
}

fn error_redirect(base: &str, message: &str, redirect: Option<&str>) -> Response {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("error", message);
    if let Some(redirect) = redirect {
        params.append_pair("redirect", redirect);
    }
    Redirect::to(&format!("{}?{}", base, params.finish())).into_response()
}

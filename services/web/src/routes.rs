//! HTTP surface: router assembly, page models, and operational endpoints.

pub mod account;
pub mod marketplace;
pub mod settings;

use axum::{
    extract::{Query, State},
    middleware as axum_middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use auth::models::Session;
use common::database;

use crate::error::ApiError;
use crate::middleware::session_gate;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_page))
        .route("/login", get(login_page))
        .route("/signup", get(signup_page))
        .route("/dashboard", get(dashboard_page))
        .route("/marketplace", get(marketplace::marketplace_page))
        .route("/settings", get(settings::settings_page))
        .route("/health", get(health_check))
        .route("/api/auth/login", post(account::login))
        .route("/api/auth/signup", post(account::signup))
        .route("/api/auth/signout", get(account::signout))
        .route(
            "/api/marketplace/filters",
            get(marketplace::get_filters)
                .post(marketplace::update_filters)
                .delete(marketplace::clear_filters),
        )
        .route("/api/marketplace/cargo", post(marketplace::create_cargo))
        .route("/api/settings/profile", post(settings::update_profile))
        .route("/api/billing/webhook", post(billing_webhook))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            session_gate,
        ))
        .with_state(state)
}

async fn home_page() -> Json<Value> {
    Json(json!({
        "page": "home",
        "title": "Freightlane",
        "tagline": "European road freight, one marketplace",
    }))
}

#[derive(Debug, Deserialize)]
struct LoginPageQuery {
    redirect: Option<String>,
    error: Option<String>,
}

// Echoes the gate's redirect/error params so the form can render the hint
// and carry the target through submission.
async fn login_page(Query(query): Query<LoginPageQuery>) -> Json<Value> {
    Json(json!({
        "page": "login",
        "redirect": query.redirect,
        "error": query.error,
    }))
}

async fn signup_page() -> Json<Value> {
    Json(json!({ "page": "signup" }))
}

async fn dashboard_page(Extension(session): Extension<Session>) -> Json<Value> {
    Json(json!({
        "page": "dashboard",
        "user": session.user,
    }))
}

async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if !database::health_check(&state.db_pool).await? {
        return Err(ApiError::InternalServerError);
    }
    let redis_ok = state.redis_pool.health_check().await.map_err(|err| {
        tracing::error!("Redis health check failed: {}", err);
        ApiError::InternalServerError
    })?;
    if !redis_ok {
        return Err(ApiError::InternalServerError);
    }
    Ok(Json(json!({ "status": "ok" })))
}

/// Billing events are acknowledged and logged only; settlement is handled
/// out of band.
async fn billing_webhook(Json(event): Json<Value>) -> Json<Value> {
    let kind = event
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    info!("Billing webhook received: {}", kind);
    Json(json!({ "received": true }))
}

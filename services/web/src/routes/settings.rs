//! Settings page and profile updates.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use auth::models::{Session, SessionUser};
use auth::FieldError;

use crate::error::ApiError;
use crate::middleware::RequireUser;
use crate::models::profile::{Profile, ProfileChanges};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsPage {
    pub page: &'static str,
    pub user: SessionUser,
    pub profile: Option<Profile>,
}

pub async fn settings_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<SettingsPage>, ApiError> {
    let profile = state
        .profile_repository
        .find_by_user_id(session.user.id)
        .await
        .map_err(|err| {
            error!("Failed to load profile: {}", err);
            ApiError::InternalServerError
        })?;

    Ok(Json(SettingsPage {
        page: "settings",
        user: session.user,
        profile,
    }))
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
    pub profile: Option<Profile>,
    /// False when a submitted address could not be geocoded; the previously
    /// stored coordinates are kept in that case.
    pub home_base_geo_updated: bool,
}

pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(payload): Json<ProfileChanges>,
) -> Response {
    let changes = payload.normalized();
    if let Err(errors) = changes.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ProfileUpdateResponse {
                ok: false,
                field_errors: errors,
                profile: None,
                home_base_geo_updated: false,
            }),
        )
            .into_response();
    }

    // A present address is geocoded; failure keeps the old coordinates and
    // is reported through the flag rather than failing the whole update.
    let (home_base, geo_updated) = match changes.home_base_address.as_deref() {
        Some(address) => match state.geocoder.resolve(address).await {
            Ok(result) => (Some(Some((result.lat, result.lng))), true),
            Err(err) => {
                warn!("Could not geocode home base {:?}: {}", address, err);
                (None, false)
            }
        },
        None => (Some(None), false),
    };

    match state
        .profile_repository
        .update(user.id, &changes, home_base)
        .await
    {
        Ok(Some(profile)) => Json(ProfileUpdateResponse {
            ok: true,
            field_errors: Vec::new(),
            profile: Some(profile),
            home_base_geo_updated: geo_updated,
        })
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Profile not found" })),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update profile: {}", err);
            ApiError::InternalServerError.into_response()
        }
    }
}

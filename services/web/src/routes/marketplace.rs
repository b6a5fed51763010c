//! Marketplace listing page, filter synchronization, and cargo creation.

use std::time::Duration;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use auth::models::Session;

use crate::error::ApiError;
use crate::filters::sync::{SyncSnapshot, DEFAULT_DEBOUNCE_MS};
use crate::filters::{self, FilterPatch, FilterState, Tab};
use crate::geocoding::GeocodeResult;
use crate::middleware::RequireUser;
use crate::models::cargo::{Cargo, NewCargo};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MarketplacePage {
    pub page: &'static str,
    pub filters: FilterState,
    /// Canonical form of the applied filters, suitable for the address bar.
    pub canonical_query: String,
    pub items: Vec<Cargo>,
    pub total: i64,
    /// Geocoded center of a proximity search, when one is active.
    pub search_center: Option<GeocodeResult>,
}

pub async fn marketplace_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    RawQuery(query): RawQuery,
) -> Result<Json<MarketplacePage>, ApiError> {
    let parsed = filters::parse(query.as_deref().unwrap_or(""));
    let filters = filters::apply_derived_rules(parsed);
    let canonical_query = filters::serialize(&filters);

    let search_center = resolve_search_center(&state, &filters).await;

    let (items, total) = match filters.tab {
        // Quotes and deals have no backing records yet; those tabs render
        // empty rather than erroring.
        Tab::MyQuotes | Tab::ActiveDeals => (Vec::new(), 0),
        _ => state
            .cargo_repository
            .list(
                &filters,
                session.user.id,
                search_center.as_ref().map(|c| (c.lat, c.lng)),
            )
            .await
            .map_err(|err| {
                error!("Failed to list cargo: {}", err);
                ApiError::InternalServerError
            })?,
    };

    Ok(Json(MarketplacePage {
        page: "marketplace",
        filters,
        canonical_query,
        items,
        total,
        search_center,
    }))
}

/// Failure to geocode the search location degrades the page to an unscoped
/// listing instead of failing the request.
async fn resolve_search_center(state: &AppState, filters: &FilterState) -> Option<GeocodeResult> {
    if !filters.radius_active() {
        return None;
    }
    let location = filters.location.as_deref()?;
    match state.geocoder.resolve(location).await {
        Ok(result) => Some(result),
        Err(err) => {
            warn!("Could not geocode search location {:?}: {}", location, err);
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FilterUpdateRequest {
    pub patch: FilterPatch,
    /// Overrides the default debounce; omitted means 400ms, or 0 for a
    /// tab-only patch.
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct FilterSyncResponse {
    pub committed: String,
    pub pending: Option<String>,
    pub state: FilterState,
}

fn sync_response(snapshot: SyncSnapshot) -> FilterSyncResponse {
    let state = filters::parse(&snapshot.committed);
    FilterSyncResponse {
        committed: snapshot.committed,
        pending: snapshot.pending,
        state,
    }
}

pub async fn update_filters(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<FilterUpdateRequest>,
) -> Json<FilterSyncResponse> {
    let debounce_ms = request.debounce_ms.unwrap_or(if request.patch.is_tab_only() {
        0
    } else {
        DEFAULT_DEBOUNCE_MS
    });

    let sync = state.filter_sessions.get_or_create(user.id);
    sync.update(&request.patch, Duration::from_millis(debounce_ms));
    Json(sync_response(sync.snapshot()))
}

pub async fn get_filters(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<FilterSyncResponse> {
    let snapshot = state
        .filter_sessions
        .get(user.id)
        .map(|sync| sync.snapshot())
        .unwrap_or(SyncSnapshot {
            committed: String::new(),
            pending: None,
        });
    Json(sync_response(snapshot))
}

#[derive(Debug, Serialize)]
pub struct ClearFiltersResponse {
    pub cleared: bool,
}

pub async fn clear_filters(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<ClearFiltersResponse> {
    Json(ClearFiltersResponse {
        cleared: state.filter_sessions.remove(user.id),
    })
}

pub async fn create_cargo(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(new_cargo): Json<NewCargo>,
) -> Response {
    if let Err(errors) = new_cargo.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "field_errors": errors })),
        )
            .into_response();
    }

    let origin = geocode_best_effort(&state, &new_cargo.origin_address).await;
    let destination = geocode_best_effort(&state, &new_cargo.destination_address).await;

    match state
        .cargo_repository
        .create(user.id, &new_cargo, origin, destination)
        .await
    {
        Ok(cargo) => (StatusCode::CREATED, Json(cargo)).into_response(),
        Err(err) => {
            error!("Failed to create cargo: {}", err);
            ApiError::InternalServerError.into_response()
        }
    }
}

async fn geocode_best_effort(state: &AppState, address: &str) -> Option<(f64, f64)> {
    match state.geocoder.resolve(address).await {
        Ok(result) => Some((result.lat, result.lng)),
        Err(err) => {
            warn!("Could not geocode cargo address {:?}: {}", address, err);
            None
        }
    }
}

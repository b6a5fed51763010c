//! Shared application state.

use std::sync::Arc;

use common::cache::RedisPool;
use sqlx::PgPool;

use auth::Authenticator;

use crate::filters::sync::FilterSessions;
use crate::geocoding::GeocodingService;
use crate::repositories::{CargoRepository, ProfileRepository};

/// State shared by every handler and the session gate.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: Arc<RedisPool>,
    pub authenticator: Arc<dyn Authenticator>,
    pub geocoder: Arc<GeocodingService>,
    pub cargo_repository: CargoRepository,
    pub profile_repository: ProfileRepository,
    pub filter_sessions: FilterSessions,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        redis_pool: Arc<RedisPool>,
        authenticator: Arc<dyn Authenticator>,
        geocoder: Arc<GeocodingService>,
        filter_sessions: FilterSessions,
    ) -> Self {
        let cargo_repository = CargoRepository::new(db_pool.clone());
        let profile_repository = ProfileRepository::new(db_pool.clone());
        Self {
            db_pool,
            redis_pool,
            authenticator,
            geocoder,
            cargo_repository,
            profile_repository,
            filter_sessions,
        }
    }
}

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use auth::rate_limiter::{RateLimiter, RateLimiterConfig};
use auth::repositories::UserRepository;
use auth::store::SessionStore;
use auth::tokens::{AuthConfig, TokenSigner};
use auth::{Authenticator, SessionService};
use common::cache::{RedisConfig, RedisPool};
use common::database::{DatabaseConfig, init_pool};

use web::config::WebConfig;
use web::filters::sync::{FilterSessions, TraceSink};
use web::geocoding::{GeocodeCache, GeocodingService, GoogleGeocoder};
use web::repositories::GeocodeCacheRepository;
use web::routes::create_router;
use web::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting web service");

    let web_config = WebConfig::from_env();

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Redis holds the refresh-session entries
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = Arc::new(RedisPool::new(&redis_config)?);

    // Session service behind the gate and the sign-in endpoints
    let auth_config = AuthConfig::from_env()?;
    let signer = TokenSigner::new(&auth_config);
    let session_store = SessionStore::new(redis_pool.clone(), auth_config.refresh_token_expiry);
    let user_repository = UserRepository::new(pool.clone());
    let throttle = RateLimiter::new(RateLimiterConfig::default());
    let authenticator: Arc<dyn Authenticator> = Arc::new(SessionService::new(
        user_repository,
        session_store,
        signer,
        throttle,
    ));

    // Geocoding: bounded in-memory cache over the persistent cache table
    let geocoder = GoogleGeocoder::new(
        web_config.google_maps_api_key.clone(),
        Duration::from_secs(web_config.geocoding_timeout_secs),
    )?;
    let geocoding = Arc::new(GeocodingService::new(
        Arc::new(geocoder),
        GeocodeCache::with_defaults(),
        GeocodeCacheRepository::new(pool.clone()),
    ));

    let filter_sessions = FilterSessions::new(Arc::new(TraceSink));

    let app_state = AppState::new(pool, redis_pool, authenticator, geocoding, filter_sessions);

    info!("Web service initialized successfully");

    // Start the web server
    let app = create_router(app_state);

    let bind_address = web_config.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Web service listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

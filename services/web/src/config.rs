//! Web service configuration sourced from environment variables.

use std::env;

/// Runtime configuration for the web frontend service.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// Google Maps Geocoding API key. Absent keys disable external geocoding;
    /// resolution then degrades to cache-only.
    pub google_maps_api_key: Option<String>,
    /// Per-attempt timeout for outbound geocoding requests, in seconds.
    pub geocoding_timeout_secs: u64,
}

impl WebConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("WEB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            geocoding_timeout_secs: env::var("GEOCODING_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! Persistent geocode cache tier, keyed by normalized address.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};

#[derive(Debug, Clone)]
pub struct GeocodeCacheRow {
    pub query_text: String,
    pub provider: String,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct GeocodeCacheRepository {
    pool: PgPool,
}

impl GeocodeCacheRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the cached row for `key` if it was written within the last
    /// `max_age_seconds`. Older rows are ignored, not deleted.
    pub async fn find_fresh(
        &self,
        key: &str,
        max_age_seconds: i64,
    ) -> Result<Option<GeocodeCacheRow>> {
        let since = Utc::now() - Duration::seconds(max_age_seconds);
        let row = sqlx::query(
            r#"
            SELECT query_text, provider, lat, lng, created_at
            FROM geocoding_cache
            WHERE query_text = $1 AND created_at >= $2
            "#,
        )
        .bind(key)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| GeocodeCacheRow {
            query_text: row.get("query_text"),
            provider: row.get("provider"),
            lat: row.get("lat"),
            lng: row.get("lng"),
            created_at: row.get("created_at"),
        }))
    }

    /// Idempotent upsert; rewriting a key refreshes its age.
    pub async fn upsert(&self, key: &str, provider: &str, lat: f64, lng: f64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO geocoding_cache (query_text, provider, lat, lng, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (query_text)
            DO UPDATE SET provider = EXCLUDED.provider, lat = EXCLUDED.lat,
                          lng = EXCLUDED.lng, created_at = NOW()
            "#,
        )
        .bind(key)
        .bind(provider)
        .bind(lat)
        .bind(lng)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

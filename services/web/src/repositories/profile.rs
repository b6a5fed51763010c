//! Profile lookups and settings updates.

use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::profile::{Profile, ProfileChanges};

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT p.user_id, u.email, u.role, p.full_name, p.company_name, p.phone,
                   p.home_base_address, p.home_base_lat, p.home_base_lng, p.updated_at
            FROM profiles p
            JOIN users u ON u.id = p.user_id
            WHERE p.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_profile_row))
    }

    /// Applies a settings-form submission. `home_base` controls the stored
    /// coordinates: `None` keeps whatever is there (geocoding failed),
    /// `Some(None)` clears them, `Some(Some(..))` replaces them.
    pub async fn update(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
        home_base: Option<Option<(f64, f64)>>,
    ) -> Result<Option<Profile>> {
        match home_base {
            Some(geo) => {
                sqlx::query(
                    r#"
                    UPDATE profiles
                    SET full_name = $2, company_name = $3, phone = $4,
                        home_base_address = $5, home_base_lat = $6, home_base_lng = $7,
                        updated_at = NOW()
                    WHERE user_id = $1
                    "#,
                )
                .bind(user_id)
                .bind(&changes.full_name)
                .bind(&changes.company_name)
                .bind(&changes.phone)
                .bind(&changes.home_base_address)
                .bind(geo.map(|(lat, _)| lat))
                .bind(geo.map(|(_, lng)| lng))
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE profiles
                    SET full_name = $2, company_name = $3, phone = $4,
                        home_base_address = $5, updated_at = NOW()
                    WHERE user_id = $1
                    "#,
                )
                .bind(user_id)
                .bind(&changes.full_name)
                .bind(&changes.company_name)
                .bind(&changes.phone)
                .bind(&changes.home_base_address)
                .execute(&self.pool)
                .await?;
            }
        }

        self.find_by_user_id(user_id).await
    }
}

fn map_profile_row(row: &PgRow) -> Profile {
    Profile {
        user_id: row.get("user_id"),
        email: row.get("email"),
        role: row.get::<String, _>("role").parse().unwrap_or_default(),
        full_name: row.get("full_name"),
        company_name: row.get("company_name"),
        phone: row.get("phone"),
        home_base_address: row.get("home_base_address"),
        home_base_lat: row.get("home_base_lat"),
        home_base_lng: row.get("home_base_lng"),
        updated_at: row.get("updated_at"),
    }
}

//! User repository for database operations

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::AuthError;
use crate::models::{User, UserRole};

fn map_user_row(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row
            .get::<String, _>("role")
            .parse()
            .unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new account with an empty profile row.
    ///
    /// Both inserts run in one transaction so a half-created account never
    /// becomes visible.
    pub async fn create(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
        full_name: Option<&str>,
        company_name: Option<&str>,
    ) -> Result<User, AuthError> {
        info!("Creating account for email: {}", email);

        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(format!("Failed to hash password: {}", e)))?
            .to_string();

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::Database(e)
            }
        })?;

        let user = map_user_row(&row);

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, full_name, company_name)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user.id)
        .bind(full_name)
        .bind(company_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_user_row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_user_row))
    }

    /// Verify a user's password against the stored argon2 hash
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AuthError::Hashing(format!("Failed to parse password hash: {}", e)))?;

        let argon2 = Argon2::default();
        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

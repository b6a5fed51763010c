//! Error types for the authentication library.

use common::error::CacheError;
use serde::Serialize;
use thiserror::Error;

/// A single failed input field with a human-readable message
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the authentication operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// Email/password combination did not match an account
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Signup attempted with an email that already has an account
    #[error("An account with this email already exists")]
    EmailTaken,

    /// Too many sign-in attempts for this account
    #[error("Too many attempts, please try again later")]
    RateLimited,

    /// One or more input fields failed validation
    #[error("Invalid input")]
    Validation(Vec<FieldError>),

    /// Presented token failed signature or shape checks
    #[error("Invalid token")]
    TokenInvalid,

    /// Presented token is past its expiry
    #[error("Token expired")]
    TokenExpired,

    /// Refresh token is expired or unusable; the session is over
    #[error("Session expired")]
    SessionExpired,

    /// Refresh token no longer matches the stored session
    #[error("Session revoked")]
    SessionRevoked,

    /// Password hashing or verification failed
    #[error("Password hashing error: {0}")]
    Hashing(String),

    /// Session store (Redis) failure
    #[error("Session store error: {0}")]
    Store(#[from] CacheError),

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid or missing configuration
    #[error("Auth configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// First field message for flows that surface a single error string
    pub fn first_message(&self) -> String {
        match self {
            AuthError::Validation(fields) => fields
                .first()
                .map(|f| f.message.clone())
                .unwrap_or_else(|| self.to_string()),
            other => other.to_string(),
        }
    }
}

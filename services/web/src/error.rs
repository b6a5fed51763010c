use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;

use auth::AuthError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal server error")]
    InternalServerError,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::SessionExpired
            | AuthError::SessionRevoked => ApiError::Unauthorized,
            AuthError::RateLimited => ApiError::TooManyRequests,
            AuthError::Validation(errors) => {
                ApiError::BadRequest(AuthError::Validation(errors).first_message())
            }
            AuthError::EmailTaken => ApiError::BadRequest("Email is already registered".to_string()),
            _ => ApiError::InternalServerError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

//! Infrastructure error types shared by the Freightlane crates.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised by PostgreSQL connectivity and queries
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while establishing a connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Invalid or unusable configuration
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised by the Redis cache layer
#[derive(Error, Debug)]
pub enum CacheError {
    /// Error occurred while opening or fetching a connection
    #[error("Redis connection error: {0}")]
    Connection(#[source] redis::RedisError),

    /// Error occurred while executing a command
    #[error("Redis command error: {0}")]
    Command(#[source] redis::RedisError),

    /// Command did not complete within the allowed time
    #[error("Redis command timed out")]
    Timeout,
}

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;

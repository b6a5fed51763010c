//! Session model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::SessionUser;

/// An authenticated session as seen by request handlers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    /// Expiry of the access token backing this session
    pub expires_at: DateTime<Utc>,
}

/// Freshly minted access/refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    /// Access token lifetime in seconds
    pub access_expires_in: u64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: u64,
}

/// Outcome of a session lookup.
///
/// `refreshed` carries a rotated token pair when the lookup transparently
/// refreshed the session; callers must propagate the matching cookies on
/// their response.
#[derive(Debug, Clone, Default)]
pub struct SessionLookup {
    pub session: Option<Session>,
    pub refreshed: Option<TokenPair>,
}

impl SessionLookup {
    /// A clean "no session" outcome (no cookies involved)
    pub fn absent() -> Self {
        Self::default()
    }
}

//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role. Unknown stored values are read back as `Shipper`, which
/// also keeps the non-admin landing behavior for roles added later.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Shipper,
    Carrier,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Shipper => "shipper",
            UserRole::Carrier => "carrier",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipper" => Ok(UserRole::Shipper),
            "carrier" => Ok(UserRole::Carrier),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// User entity as stored in the `users` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity projected into tokens and sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Signup payload as submitted by the signup form
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Requested role; only "shipper" and "carrier" are accepted
    pub user_type: String,
    pub terms_accepted: bool,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [UserRole::Shipper, UserRole::Carrier, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }
}

//! Account profiles edited on the settings page.

use std::sync::OnceLock;

use auth::models::UserRole;
use auth::FieldError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub home_base_address: Option<String>,
    pub home_base_lat: Option<f64>,
    pub home_base_lng: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// A full settings-form submission. Optional fields submitted blank clear
/// the stored value.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileChanges {
    pub full_name: String,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub home_base_address: Option<String>,
}

impl ProfileChanges {
    /// Trims every field and drops optionals that trim to empty.
    pub fn normalized(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            company_name: normalize_optional(&self.company_name),
            phone: normalize_optional(&self.phone),
            home_base_address: normalize_optional(&self.home_base_address),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let name_len = self.full_name.trim().chars().count();
        if !(2..=80).contains(&name_len) {
            errors.push(FieldError::new(
                "full_name",
                "Full name must be between 2 and 80 characters long",
            ));
        }

        if let Some(company) = &self.company_name {
            if company.trim().chars().count() > 120 {
                errors.push(FieldError::new(
                    "company_name",
                    "Company name must be at most 120 characters long",
                ));
            }
        }

        if let Some(address) = &self.home_base_address {
            if address.trim().chars().count() > 160 {
                errors.push(FieldError::new(
                    "home_base_address",
                    "Address must be at most 160 characters long",
                ));
            }
        }

        if let Some(phone) = &self.phone {
            if !phone_regex().is_match(phone.trim()) {
                errors.push(FieldError::new("phone", "Invalid phone number format"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn normalize_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn phone_regex() -> &'static Regex {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^\+?\d[\d\s-]{7,}$").expect("Failed to compile phone regex")
    })
}

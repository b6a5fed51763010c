//! Cargo load listings offered on the marketplace.

use auth::FieldError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::filters::Urgency;

#[derive(Debug, Clone, Serialize)]
pub struct Cargo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub company_name: Option<String>,
    pub origin_address: String,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub destination_address: String,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub vehicle_type: String,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub price_eur: f64,
    pub urgency: Urgency,
    pub load_date: Option<NaiveDate>,
    /// Distance from the search reference point, present only under the
    /// proximity sort.
    pub distance_km: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCargo {
    pub title: String,
    pub company_name: Option<String>,
    pub origin_address: String,
    pub destination_address: String,
    pub vehicle_type: String,
    pub weight_kg: Option<f64>,
    pub volume_m3: Option<f64>,
    pub price_eur: f64,
    pub urgency: Option<Urgency>,
    pub load_date: Option<NaiveDate>,
}

impl NewCargo {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.len() > 160 {
            errors.push(FieldError::new("title", "Title must be at most 160 characters long"));
        }

        validate_address(&self.origin_address, "origin_address", &mut errors);
        validate_address(&self.destination_address, "destination_address", &mut errors);

        if self.vehicle_type.trim().is_empty() {
            errors.push(FieldError::new("vehicle_type", "Vehicle type is required"));
        } else if self.vehicle_type.trim().len() > 60 {
            errors.push(FieldError::new(
                "vehicle_type",
                "Vehicle type must be at most 60 characters long",
            ));
        }

        if !self.price_eur.is_finite() || self.price_eur < 0.0 {
            errors.push(FieldError::new("price_eur", "Price must be a non-negative number"));
        }

        if let Some(weight) = self.weight_kg {
            if !weight.is_finite() || weight < 0.0 {
                errors.push(FieldError::new(
                    "weight_kg",
                    "Weight must be a non-negative number",
                ));
            }
        }

        if let Some(volume) = self.volume_m3 {
            if !volume.is_finite() || volume < 0.0 {
                errors.push(FieldError::new(
                    "volume_m3",
                    "Volume must be a non-negative number",
                ));
            }
        }

        if let Some(company) = &self.company_name {
            if company.trim().len() > 120 {
                errors.push(FieldError::new(
                    "company_name",
                    "Company name must be at most 120 characters long",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_address(value: &str, field: &str, errors: &mut Vec<FieldError>) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "Address is required"));
    } else if trimmed.len() > 200 {
        errors.push(FieldError::new(
            field,
            "Address must be at most 200 characters long",
        ));
    }
}

//! Input validation for the auth flows

use regex::Regex;
use std::sync::OnceLock;

use crate::error::FieldError;
use crate::models::{NewAccount, UserRole};

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 6 {
        return Err("Password must be at least 6 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

fn validate_optional_name(value: &Option<String>, field: &str, errors: &mut Vec<FieldError>) {
    if let Some(name) = value {
        if name.trim().len() > 200 {
            errors.push(FieldError::new(
                field,
                "Must be at most 200 characters long",
            ));
        }
    }
}

/// Validate a signup payload; returns the resolved role on success
pub fn validate_signup(account: &NewAccount) -> Result<UserRole, Vec<FieldError>> {
    let mut errors = Vec::new();

    if let Err(message) = validate_email(&account.email) {
        errors.push(FieldError::new("email", message));
    }

    if let Err(message) = validate_password(&account.password) {
        errors.push(FieldError::new("password", message));
    }

    if account.confirm_password != account.password {
        errors.push(FieldError::new("confirm_password", "Passwords do not match"));
    }

    let role = match account.user_type.as_str() {
        "shipper" => Some(UserRole::Shipper),
        "carrier" => Some(UserRole::Carrier),
        _ => {
            errors.push(FieldError::new(
                "user_type",
                "Account type must be shipper or carrier",
            ));
            None
        }
    };

    if !account.terms_accepted {
        errors.push(FieldError::new("terms", "You must accept the terms of service"));
    }

    validate_optional_name(&account.full_name, "full_name", &mut errors);
    validate_optional_name(&account.company_name, "company_name", &mut errors);

    match (errors.is_empty(), role) {
        (true, Some(role)) => Ok(role),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> NewAccount {
        NewAccount {
            email: "maria@transport.ro".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            user_type: "carrier".to_string(),
            terms_accepted: true,
            full_name: Some("Maria Pop".to_string()),
            company_name: None,
        }
    }

    #[test]
    fn valid_signup_resolves_role() {
        assert_eq!(validate_signup(&account()), Ok(UserRole::Carrier));
    }

    #[test]
    fn email_format_is_enforced() {
        assert!(validate_email("maria@transport.ro").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn mismatched_confirmation_is_a_field_error() {
        let mut acc = account();
        acc.confirm_password = "different".to_string();
        let errors = validate_signup(&acc).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "confirm_password"));
    }

    #[test]
    fn admin_cannot_be_requested_at_signup() {
        let mut acc = account();
        acc.user_type = "admin".to_string();
        let errors = validate_signup(&acc).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "user_type"));
    }

    #[test]
    fn terms_must_be_accepted() {
        let mut acc = account();
        acc.terms_accepted = false;
        let errors = validate_signup(&acc).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "terms"));
    }

    #[test]
    fn overlong_names_are_rejected() {
        let mut acc = account();
        acc.company_name = Some("x".repeat(201));
        let errors = validate_signup(&acc).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "company_name"));
    }
}

//! Token signing and verification
//!
//! Signs and validates the HS256 access/refresh token pair that backs
//! cookie sessions.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::AuthError;
use crate::models::{SessionUser, TokenPair, UserRole};

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for signing tokens
    pub jwt_secret: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_JWT_SECRET`: signing secret (required)
    /// - `AUTH_ACCESS_TOKEN_EXPIRY`: access token expiry in seconds (default: 900)
    /// - `AUTH_REFRESH_TOKEN_EXPIRY`: refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self, AuthError> {
        let jwt_secret = std::env::var("AUTH_JWT_SECRET").map_err(|_| {
            AuthError::Configuration("AUTH_JWT_SECRET environment variable not set".to_string())
        })?;

        let access_token_expiry = std::env::var("AUTH_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("AUTH_REFRESH_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(604800);

        Ok(AuthConfig {
            jwt_secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Account email
    pub email: String,
    /// Account role
    pub role: UserRole,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

impl Claims {
    /// Identity carried by this token
    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.sub,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_expiry: u64,
    refresh_token_expiry: u64,
}

impl TokenSigner {
    /// Initialize a signer from configuration
    pub fn new(config: &AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenSigner {
            encoding_key,
            decoding_key,
            validation,
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
        }
    }

    fn now() -> Result<u64, AuthError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| AuthError::Configuration(format!("System clock error: {}", e)))
    }

    fn issue(&self, user: &SessionUser, token_type: TokenType, expiry: u64) -> Result<String, AuthError> {
        let now = Self::now()?;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + expiry,
            token_type,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenInvalid)
    }

    /// Issue a fresh access/refresh pair for a user
    pub fn issue_pair(&self, user: &SessionUser) -> Result<TokenPair, AuthError> {
        let access = self.issue(user, TokenType::Access, self.access_token_expiry)?;
        let refresh = self.issue(user, TokenType::Refresh, self.refresh_token_expiry)?;

        Ok(TokenPair {
            access,
            refresh,
            access_expires_in: self.access_token_expiry,
            refresh_expires_in: self.refresh_token_expiry,
        })
    }

    /// Validate a token of the expected type and return its claims
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })?;

        if token_data.claims.token_type != expected {
            return Err(AuthError::TokenInvalid);
        }

        Ok(token_data.claims)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.refresh_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-not-for-production".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        }
    }

    fn test_user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            role: UserRole::Carrier,
        }
    }

    #[test]
    fn issued_pair_verifies_with_matching_claims() {
        let signer = TokenSigner::new(&test_config());
        let user = test_user();

        let pair = signer.issue_pair(&user).expect("issue pair");

        let access = signer.verify(&pair.access, TokenType::Access).expect("verify access");
        assert_eq!(access.sub, user.id);
        assert_eq!(access.email, user.email);
        assert_eq!(access.role, UserRole::Carrier);

        let refresh = signer.verify(&pair.refresh, TokenType::Refresh).expect("verify refresh");
        assert_eq!(refresh.sub, user.id);
    }

    #[test]
    fn wrong_token_type_is_rejected() {
        let signer = TokenSigner::new(&test_config());
        let pair = signer.issue_pair(&test_user()).expect("issue pair");

        let err = signer.verify(&pair.refresh, TokenType::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let config = test_config();
        let signer = TokenSigner::new(&config);
        let user = test_user();

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now - 200,
            exp: now - 100,
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let err = signer.verify(&token, TokenType::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let signer = TokenSigner::new(&test_config());
        let err = signer.verify("not-a-jwt", TokenType::Access).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }
}

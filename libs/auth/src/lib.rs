//! Authentication library for the Freightlane services
//!
//! Accounts, password sign-in, and the cookie-backed session lifecycle:
//! HS256 token pairs, a Redis refresh-session store with rotation, signup
//! validation, and a sign-in throttle. The web service consumes all of it
//! through the [`Authenticator`] trait.

pub mod cookies;
pub mod error;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod service;
pub mod store;
pub mod tokens;
pub mod validation;

pub use error::{AuthError, FieldError};
pub use models::{NewAccount, Session, SessionLookup, SessionUser, TokenPair, UserRole};
pub use service::{Authenticator, SessionService};

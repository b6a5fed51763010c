//! Authentication library models

pub mod session;
pub mod user;

// Re-export for convenience
pub use session::{Session, SessionLookup, TokenPair};
pub use user::{NewAccount, SessionUser, User, UserRole};

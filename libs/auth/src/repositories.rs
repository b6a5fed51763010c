//! Data access layer for the authentication library

pub mod user;

pub use user::UserRepository;

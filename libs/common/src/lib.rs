//! Common library for the Freightlane services
//!
//! This crate provides infrastructure shared across the Freightlane
//! workspace: PostgreSQL connection pooling, the Redis cache wrapper, and
//! the error types both expose.

pub mod cache;
pub mod database;
pub mod error;

//! Freightlane web service
//!
//! Serves the marketplace pages and their JSON APIs: route classification
//! and the session gate in front of every request, the filter query codec
//! with its debounced URL sync, the cargo listing queries, and the cached
//! geocoding pipeline behind location search and profile home bases.

pub mod config;
pub mod error;
pub mod filters;
pub mod geocoding;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

//! Data access layer for the web service.

pub mod cargo;
pub mod geocode_cache;
pub mod profile;

pub use cargo::CargoRepository;
pub use geocode_cache::{GeocodeCacheRepository, GeocodeCacheRow};
pub use profile::ProfileRepository;

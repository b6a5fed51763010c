//! Domain models for the web service.

pub mod cargo;
pub mod profile;

pub use cargo::{Cargo, NewCargo};
pub use profile::{Profile, ProfileChanges};

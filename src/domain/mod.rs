//! Domain layer types and invariants.

pub mod credits;
pub mod error;
pub mod posts;
pub mod reports;
pub mod saved;

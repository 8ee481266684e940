//! Application services and the persistence seams they depend on.

pub mod clock;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod pagination;
pub mod repos;
pub mod sources;

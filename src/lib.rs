//! Creator dashboard core: a cached multi-source feed aggregator and a
//! transactional credit ledger, served over HTTP.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

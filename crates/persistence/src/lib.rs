//! Persistence layer for the lending tracker.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional lending store
//! - SQL migrations (`src/migrations`)

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;

pub use error::LendingStoreError;

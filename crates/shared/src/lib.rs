//! Shared utilities and common types for the lending tracker backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Session token validation
//! - Common validation logic
//! - Pagination helpers

pub mod jwt;
pub mod pagination;
pub mod validation;

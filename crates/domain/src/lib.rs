//! Domain layer for the lending tracker.
//!
//! This crate contains:
//! - Domain models (ItemGroup, Item, RequestedItem, ApprovedItem, ItemHistory)
//! - The lending engines: pure state transitions over owned model values
//! - Domain error types and the notification abstraction

pub mod models;
pub mod services;

//! Domain services for the lending tracker.
//!
//! The engines are pure functions: they take the loaded (and locked) rows by
//! value and return the rows to write back. A refused transition returns an
//! error and nothing to persist.

pub mod approval;
pub mod catalog;
pub mod error;
pub mod lending;
pub mod notification;
pub mod policy;
pub mod reminders;
pub mod request;

#[cfg(test)]
pub(crate) mod fixtures;

pub use approval::{approve, update_duration, ApprovalCandidate, ApprovalOutcome, HeldShare};
pub use error::{ErrorKind, LendingError};
pub use lending::{acknowledge, release_item, return_item, ReturnOutcome};
pub use notification::{
    MockNotificationService, Notification, NotificationResult, NotificationService,
    NotificationTemplate,
};
pub use policy::{ensure_same_org, require_inventory_manager};
pub use reminders::{is_overdue, reminder_for, return_due_at};
pub use request::{cancel_request, reject_request, submit_request};

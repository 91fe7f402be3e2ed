//! Checks shared by the engines.

use uuid::Uuid;

use super::error::LendingError;
use crate::models::{ItemType, UserContext};

/// Fails unless the caller belongs to `organization_id`.
pub fn ensure_same_org(ctx: &UserContext, organization_id: Uuid) -> Result<(), LendingError> {
    if ctx.organization_id == organization_id {
        Ok(())
    } else {
        Err(LendingError::OrganizationMismatch)
    }
}

/// Fails unless the caller is an admin or manager.
pub fn require_inventory_manager(ctx: &UserContext) -> Result<(), LendingError> {
    if ctx.manages_inventory() {
        Ok(())
    } else {
        Err(LendingError::InsufficientRole)
    }
}

/// Normalizes a lending duration for an item type.
///
/// Permanent lendings never carry a duration, whatever was supplied.
pub fn resolve_duration(
    item_type: ItemType,
    duration: Option<i32>,
) -> Result<Option<i32>, LendingError> {
    if !item_type.requires_duration() {
        return Ok(None);
    }

    match duration {
        None => Err(LendingError::NoDuration),
        Some(days) if days <= 0 => Err(LendingError::InvalidDuration),
        Some(days) => Ok(Some(days)),
    }
}

//! Request engine: creating, cancelling and rejecting borrowing requests.

use chrono::{DateTime, Utc};

use super::error::LendingError;
use super::policy::{ensure_same_org, resolve_duration};
use crate::models::requested_item::CreateRequestRequest;
use crate::models::{
    ItemGroup, ItemType, NewRequestedItem, RequestStatus, RequestedItem, UserContext,
};

/// Validates a borrowing request against its item group.
pub fn submit_request(
    requester: &UserContext,
    group: &ItemGroup,
    payload: CreateRequestRequest,
    now: DateTime<Utc>,
) -> Result<NewRequestedItem, LendingError> {
    if !requester.has_phone() {
        return Err(LendingError::NoPhoneNumber);
    }
    ensure_same_org(requester, group.organization_id)?;

    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(LendingError::InvalidQuantity);
    }
    if !group.is_accessory && quantity != 1 {
        return Err(LendingError::QuantityNotAllowed);
    }
    if group.is_accessory && payload.item_type != ItemType::Permanent {
        return Err(LendingError::InvalidItemRequest);
    }

    let requested_duration = resolve_duration(payload.item_type, payload.requested_duration)?;

    Ok(NewRequestedItem {
        item_group_id: group.id,
        requested_by: requester.id,
        item_type: payload.item_type,
        quantity,
        requested_duration,
        status: RequestStatus::Pending,
        current_status_date: now,
    })
}

/// Withdraws a pending request. Only the requester may cancel.
pub fn cancel_request(
    requester: &UserContext,
    request: RequestedItem,
    now: DateTime<Utc>,
) -> Result<RequestedItem, LendingError> {
    if request.requested_by != requester.id {
        return Err(LendingError::NotFound("request"));
    }
    close(request, RequestStatus::Cancelled, now)
}

/// Turns down a pending request.
///
/// Admins and managers may reject any request of their organization. A plain
/// user may only reject shareable requests in a group where they hold an
/// acknowledged shareable item and nothing else is free (`can_pass_share`).
pub fn reject_request(
    approver: &UserContext,
    request: RequestedItem,
    group: &ItemGroup,
    can_pass_share: bool,
    now: DateTime<Utc>,
) -> Result<RequestedItem, LendingError> {
    ensure_same_org(approver, group.organization_id)?;
    if request.item_group_id != group.id {
        return Err(LendingError::ItemGroupMismatch);
    }

    if !approver.manages_inventory()
        && !(request.item_type == ItemType::Shareable && can_pass_share)
    {
        return Err(LendingError::NotFound("request"));
    }

    close(request, RequestStatus::Rejected, now)
}

fn close(
    mut request: RequestedItem,
    status: RequestStatus,
    now: DateTime<Utc>,
) -> Result<RequestedItem, LendingError> {
    if !request.is_pending() {
        return Err(LendingError::RequestNotPending);
    }
    request.status = status;
    request.current_status_date = now;
    Ok(request)
}

//! Approval engine: granting a concrete item against a pending request.

use chrono::{DateTime, Utc};

use super::error::LendingError;
use super::lending::release_item;
use super::policy::{ensure_same_org, require_inventory_manager, resolve_duration};
use crate::models::{
    ApprovalStatus, ApprovedItem, Item, ItemGroup, ItemType, NewApprovedItem, RequestStatus,
    RequestedItem, Role, UserContext,
};

/// A grant currently held by the approver, with the quantity it was lent for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldShare {
    pub approval: ApprovedItem,
    pub quantity: i32,
}

/// Everything the approval engine decides over, loaded and locked by the store.
#[derive(Debug, Clone)]
pub struct ApprovalCandidate {
    pub request: RequestedItem,
    pub request_group: ItemGroup,
    pub item: Item,
    pub item_group: ItemGroup,
    /// The approver's acknowledged grant of `item`, if any.
    pub held_share: Option<HeldShare>,
}

/// State to persist after a successful approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub request: RequestedItem,
    pub item: Item,
    /// The approver's own grant, returned so the item can be passed on.
    pub reclaimed: Option<ApprovedItem>,
    pub grant: NewApprovedItem,
}

/// Approves a pending request with a concrete item.
///
/// On error nothing is returned, so the caller has nothing to persist.
pub fn approve(
    approver: &UserContext,
    candidate: ApprovalCandidate,
    approved_duration: Option<i32>,
    now: DateTime<Utc>,
) -> Result<ApprovalOutcome, LendingError> {
    let ApprovalCandidate {
        mut request,
        request_group,
        mut item,
        item_group,
        held_share,
    } = candidate;

    ensure_same_org(approver, request_group.organization_id)?;
    ensure_same_org(approver, item_group.organization_id)?;

    if request.status != RequestStatus::Pending {
        return Err(LendingError::RequestNotPending);
    }
    if item.item_group_id != request.item_group_id {
        return Err(LendingError::ItemGroupMismatch);
    }
    if item.item_type != request.item_type {
        return Err(LendingError::InvalidItemRequest);
    }
    if item.is_assigned && item.item_type != ItemType::Shareable {
        return Err(LendingError::ItemAlreadyAssigned);
    }

    let duration = if approver.role == Role::User {
        request.requested_duration
    } else {
        approved_duration
    };
    let approved_duration = resolve_duration(request.item_type, duration)?;

    let held_share = held_share.filter(|share| {
        share.approval.approved_to == approver.id
            && share.approval.item_id == item.id
            && share.approval.status == ApprovalStatus::Acknowledged
            && !item_group.is_accessory
    });

    let reclaimed = match held_share {
        Some(share) => {
            if item.item_type != ItemType::Shareable || item_group.is_accessory {
                return Err(LendingError::ApproveNonShareableItem);
            }
            let mut approval = share.approval;
            approval.status = ApprovalStatus::Returned;
            approval.current_status_date = now;
            item = release_item(item, share.quantity);
            Some(approval)
        }
        None if approver.role == Role::User => {
            return Err(LendingError::NotFound("approved item"));
        }
        None => None,
    };

    if request.quantity > item.quantity {
        return Err(LendingError::InsufficientQuantity);
    }

    item.quantity -= request.quantity;
    if item.quantity == 0 {
        item.is_assigned = true;
    }
    request.status = RequestStatus::Approved;
    request.current_status_date = now;

    let grant = NewApprovedItem {
        request_id: request.id,
        approved_by: approver.id,
        approved_to: request.requested_by,
        item_id: item.id,
        approved_duration,
        status: ApprovalStatus::Pending,
        current_status_date: now,
    };

    Ok(ApprovalOutcome {
        request,
        item,
        reclaimed,
        grant,
    })
}

/// Changes the lending duration of a grant.
pub fn update_duration(
    actor: &UserContext,
    mut approval: ApprovedItem,
    item: &Item,
    item_group: &ItemGroup,
    approved_duration: Option<i32>,
) -> Result<ApprovedItem, LendingError> {
    require_inventory_manager(actor)?;
    ensure_same_org(actor, item_group.organization_id)?;

    if item.item_type == ItemType::Permanent {
        return Err(LendingError::PermanentDurationUpdate);
    }
    if approval.status == ApprovalStatus::Returned {
        return Err(LendingError::ReturnedDurationUpdate);
    }

    match approved_duration {
        Some(days) if days > 0 => {
            approval.approved_duration = Some(days);
            Ok(approval)
        }
        _ => Err(LendingError::InvalidDuration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures::context;
    use crate::services::fixtures;
    use crate::services::lending::{acknowledge, return_item};
    use uuid::Uuid;

    fn candidate(request: &RequestedItem, group: &ItemGroup, item: &Item) -> ApprovalCandidate {
        ApprovalCandidate {
            request: request.clone(),
            request_group: group.clone(),
            item: item.clone(),
            item_group: group.clone(),
            held_share: None,
        }
    }

    #[test]
    fn test_approve_returnable_request() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Returnable, 1);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));
        let now = fixtures::now();

        let outcome = approve(&admin, candidate(&request, &group, &item), Some(10), now).unwrap();

        assert_eq!(outcome.item.quantity, 0);
        assert!(outcome.item.is_assigned);
        assert_eq!(outcome.request.status, RequestStatus::Approved);
        assert_eq!(outcome.request.current_status_date, now);
        assert!(outcome.reclaimed.is_none());
        assert_eq!(outcome.grant.approved_to, request.requested_by);
        assert_eq!(outcome.grant.approved_by, admin.id);
        assert_eq!(outcome.grant.approved_duration, Some(10));
        assert_eq!(outcome.grant.status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_approve_cancelled_request_fails() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Returnable, 1);
        let mut request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));
        request.status = RequestStatus::Cancelled;

        assert_eq!(
            approve(&admin, candidate(&request, &group, &item), Some(7), fixtures::now()),
            Err(LendingError::RequestNotPending)
        );
    }

    #[test]
    fn test_approve_across_organizations_fails() {
        let admin = context(Uuid::new_v4(), Role::Admin);
        let group = fixtures::group(Uuid::new_v4(), false);
        let item = fixtures::item(&group, ItemType::Returnable, 1);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));

        assert_eq!(
            approve(&admin, candidate(&request, &group, &item), Some(7), fixtures::now()),
            Err(LendingError::OrganizationMismatch)
        );
    }

    #[test]
    fn test_approve_item_from_other_group_fails() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let laptops = fixtures::group(org, false);
        let phones = fixtures::group(org, false);
        let item = fixtures::item(&phones, ItemType::Returnable, 1);
        let request = fixtures::request(&laptops, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));

        let mut candidate = candidate(&request, &laptops, &item);
        candidate.item_group = phones;

        assert_eq!(
            approve(&admin, candidate, Some(7), fixtures::now()),
            Err(LendingError::ItemGroupMismatch)
        );
    }

    #[test]
    fn test_approve_type_mismatch_fails() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Shareable, 1);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));

        assert_eq!(
            approve(&admin, candidate(&request, &group, &item), Some(7), fixtures::now()),
            Err(LendingError::InvalidItemRequest)
        );
    }

    #[test]
    fn test_approve_assigned_returnable_fails() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Returnable, 0);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));

        assert_eq!(
            approve(&admin, candidate(&request, &group, &item), Some(7), fixtures::now()),
            Err(LendingError::ItemAlreadyAssigned)
        );
    }

    #[test]
    fn test_approve_zero_duration_fails() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Returnable, 1);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));

        assert_eq!(
            approve(&admin, candidate(&request, &group, &item), Some(0), fixtures::now()),
            Err(LendingError::InvalidDuration)
        );
        assert_eq!(
            approve(&admin, candidate(&request, &group, &item), None, fixtures::now()),
            Err(LendingError::NoDuration)
        );
    }

    #[test]
    fn test_approve_accessory_permanent_discards_duration() {
        let org = Uuid::new_v4();
        let manager = context(org, Role::Manager);
        let mice = fixtures::group(org, true);
        let item = fixtures::item(&mice, ItemType::Permanent, 5);
        let request = fixtures::request(&mice, Uuid::new_v4(), ItemType::Permanent, 2, None);

        let outcome =
            approve(&manager, candidate(&request, &mice, &item), Some(30), fixtures::now()).unwrap();

        assert_eq!(outcome.item.quantity, 3);
        assert!(!outcome.item.is_assigned);
        assert_eq!(outcome.grant.approved_duration, None);
    }

    #[test]
    fn test_approve_more_than_available_fails() {
        let org = Uuid::new_v4();
        let manager = context(org, Role::Manager);
        let mice = fixtures::group(org, true);
        let item = fixtures::item(&mice, ItemType::Permanent, 1);
        let request = fixtures::request(&mice, Uuid::new_v4(), ItemType::Permanent, 2, None);

        assert_eq!(
            approve(&manager, candidate(&request, &mice, &item), None, fixtures::now()),
            Err(LendingError::InsufficientQuantity)
        );
    }

    #[test]
    fn test_user_without_share_cannot_approve() {
        let org = Uuid::new_v4();
        let user = context(org, Role::User);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Shareable, 1);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Shareable, 1, Some(7));

        assert_eq!(
            approve(&user, candidate(&request, &group, &item), Some(7), fixtures::now()),
            Err(LendingError::NotFound("approved item"))
        );
    }

    #[test]
    fn test_user_passes_shareable_item_on() {
        let org = Uuid::new_v4();
        let holder = context(org, Role::User);
        let group = fixtures::group(org, false);
        let mut item = fixtures::item(&group, ItemType::Shareable, 0);
        item.is_assigned = true;

        let own_request = fixtures::request(&group, holder.id, ItemType::Shareable, 1, Some(5));
        let held = fixtures::approval(&own_request, &item, Uuid::new_v4(), ApprovalStatus::Acknowledged);

        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Shareable, 1, Some(9));
        let mut candidate = candidate(&request, &group, &item);
        candidate.held_share = Some(HeldShare {
            approval: held.clone(),
            quantity: 1,
        });
        let now = fixtures::now();

        let outcome = approve(&holder, candidate, Some(30), now).unwrap();

        let reclaimed = outcome.reclaimed.unwrap();
        assert_eq!(reclaimed.id, held.id);
        assert_eq!(reclaimed.status, ApprovalStatus::Returned);
        assert_eq!(reclaimed.current_status_date, now);
        assert_eq!(outcome.item.quantity, 0);
        assert!(outcome.item.is_assigned);
        // plain users pass the item on for the requested duration
        assert_eq!(outcome.grant.approved_duration, Some(9));
        assert_eq!(outcome.grant.approved_to, request.requested_by);
    }

    #[test]
    fn test_unacknowledged_share_is_not_reclaimed() {
        let org = Uuid::new_v4();
        let holder = context(org, Role::User);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Shareable, 0);

        let own_request = fixtures::request(&group, holder.id, ItemType::Shareable, 1, Some(5));
        let held = fixtures::approval(&own_request, &item, Uuid::new_v4(), ApprovalStatus::Pending);

        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Shareable, 1, Some(9));
        let mut candidate = candidate(&request, &group, &item);
        candidate.held_share = Some(HeldShare {
            approval: held,
            quantity: 1,
        });

        assert_eq!(
            approve(&holder, candidate, None, fixtures::now()),
            Err(LendingError::NotFound("approved item"))
        );
    }

    #[test]
    fn test_holder_of_returnable_item_cannot_share_it() {
        let org = Uuid::new_v4();
        let manager = context(org, Role::Manager);
        let group = fixtures::group(org, false);
        let mut item = fixtures::item(&group, ItemType::Returnable, 1);
        item.is_assigned = false;

        let own_request = fixtures::request(&group, manager.id, ItemType::Returnable, 1, Some(5));
        let held = fixtures::approval(&own_request, &item, Uuid::new_v4(), ApprovalStatus::Acknowledged);

        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(9));
        let mut candidate = candidate(&request, &group, &item);
        candidate.held_share = Some(HeldShare {
            approval: held,
            quantity: 1,
        });

        assert_eq!(
            approve(&manager, candidate, Some(9), fixtures::now()),
            Err(LendingError::ApproveNonShareableItem)
        );
    }

    #[test]
    fn test_shareable_quantity_is_conserved() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Shareable, 3);
        let now = fixtures::now();

        let first_borrower = context(org, Role::User);
        let first = fixtures::request(&group, first_borrower.id, ItemType::Shareable, 1, Some(3));
        let outcome = approve(&admin, candidate(&first, &group, &item), Some(3), now).unwrap();
        assert_eq!(outcome.item.quantity, 2);
        let item = outcome.item;
        let first_grant = outcome.grant;

        let second = fixtures::request(&group, Uuid::new_v4(), ItemType::Shareable, 1, Some(3));
        let outcome = approve(&admin, candidate(&second, &group, &item), Some(3), now).unwrap();
        assert_eq!(outcome.item.quantity, 1);
        assert!(!outcome.item.is_assigned);
        let item = outcome.item;

        let stored = ApprovedItem {
            id: Uuid::new_v4(),
            request_id: first_grant.request_id,
            approved_by: first_grant.approved_by,
            approved_to: first_grant.approved_to,
            item_id: first_grant.item_id,
            approved_duration: first_grant.approved_duration,
            status: first_grant.status,
            current_status_date: now,
            created_at: now,
            updated_at: now,
        };
        let acknowledged = acknowledge(&first_borrower, stored, now).unwrap();
        let returned = return_item(&first_borrower, acknowledged, item, &group, 1, now).unwrap();

        assert_eq!(returned.item.quantity, 2);
        assert!(!returned.item.is_assigned);
        assert_eq!(returned.approval.status, ApprovalStatus::Returned);
    }

    #[test]
    fn test_update_duration() {
        let org = Uuid::new_v4();
        let manager = context(org, Role::Manager);
        let group = fixtures::group(org, false);
        let item = fixtures::item(&group, ItemType::Returnable, 0);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));
        let approval = fixtures::approval(&request, &item, manager.id, ApprovalStatus::Acknowledged);

        let updated = update_duration(&manager, approval.clone(), &item, &group, Some(21)).unwrap();
        assert_eq!(updated.approved_duration, Some(21));

        assert_eq!(
            update_duration(&manager, approval.clone(), &item, &group, Some(0)),
            Err(LendingError::InvalidDuration)
        );
        assert_eq!(
            update_duration(&manager, approval, &item, &group, None),
            Err(LendingError::InvalidDuration)
        );
    }

    #[test]
    fn test_update_duration_refusals() {
        let org = Uuid::new_v4();
        let manager = context(org, Role::Manager);
        let group = fixtures::group(org, false);

        let permanent = fixtures::item(&group, ItemType::Permanent, 0);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Permanent, 1, None);
        let approval = fixtures::approval(&request, &permanent, manager.id, ApprovalStatus::Pending);
        assert_eq!(
            update_duration(&manager, approval, &permanent, &group, Some(3)),
            Err(LendingError::PermanentDurationUpdate)
        );

        let returnable = fixtures::item(&group, ItemType::Returnable, 1);
        let request = fixtures::request(&group, Uuid::new_v4(), ItemType::Returnable, 1, Some(7));
        let approval = fixtures::approval(&request, &returnable, manager.id, ApprovalStatus::Returned);
        assert_eq!(
            update_duration(&manager, approval.clone(), &returnable, &group, Some(3)),
            Err(LendingError::ReturnedDurationUpdate)
        );

        let user = context(org, Role::User);
        assert_eq!(
            update_duration(&user, approval, &returnable, &group, Some(3)),
            Err(LendingError::InsufficientRole)
        );
    }
}

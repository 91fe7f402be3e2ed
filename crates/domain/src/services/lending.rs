//! Acknowledge/return engine.

use chrono::{DateTime, Utc};

use super::error::LendingError;
use crate::models::{ApprovalStatus, ApprovedItem, Item, ItemGroup, ItemType, UserContext};

/// Puts `quantity` units of an item back into the inventory.
///
/// Used both when a holder returns a grant and when a shareable grant is
/// reclaimed by a new approval.
pub fn release_item(mut item: Item, quantity: i32) -> Item {
    item.quantity += quantity;
    item.is_assigned = false;
    item
}

/// Result of returning a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnOutcome {
    pub approval: ApprovedItem,
    pub item: Item,
}

/// Confirms receipt of a pending grant.
pub fn acknowledge(
    holder: &UserContext,
    mut approval: ApprovedItem,
    now: DateTime<Utc>,
) -> Result<ApprovedItem, LendingError> {
    if approval.approved_to != holder.id {
        return Err(LendingError::NotFound("approved item"));
    }
    if approval.status != ApprovalStatus::Pending {
        return Err(LendingError::AcknowledgeNotAllowed);
    }

    approval.status = ApprovalStatus::Acknowledged;
    approval.current_status_date = now;
    Ok(approval)
}

/// Hands an acknowledged grant back and releases the item.
///
/// `quantity` is the quantity of the request the grant was made for.
pub fn return_item(
    holder: &UserContext,
    mut approval: ApprovedItem,
    item: Item,
    group: &ItemGroup,
    quantity: i32,
    now: DateTime<Utc>,
) -> Result<ReturnOutcome, LendingError> {
    if approval.approved_to != holder.id {
        return Err(LendingError::NotFound("approved item"));
    }
    if item.item_type == ItemType::Permanent || group.is_accessory {
        return Err(LendingError::ReturnPermanentItem);
    }
    if approval.status != ApprovalStatus::Acknowledged {
        return Err(LendingError::ReturnNotAllowed);
    }

    approval.status = ApprovalStatus::Returned;
    approval.current_status_date = now;

    Ok(ReturnOutcome {
        approval,
        item: release_item(item, quantity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures::context;
    use crate::models::Role;
    use crate::services::fixtures;
    use uuid::Uuid;

    struct Lent {
        holder: UserContext,
        group: ItemGroup,
        item: Item,
        approval: ApprovedItem,
    }

    fn lent(item_type: ItemType, status: ApprovalStatus) -> Lent {
        let org = Uuid::new_v4();
        let holder = context(org, Role::User);
        let group = fixtures::group(org, false);
        let mut item = fixtures::item(&group, item_type, 0);
        item.is_assigned = true;
        let duration = item_type.requires_duration().then_some(7);
        let request = fixtures::request(&group, holder.id, item_type, 1, duration);
        let approval = fixtures::approval(&request, &item, Uuid::new_v4(), status);
        Lent {
            holder,
            group,
            item,
            approval,
        }
    }

    #[test]
    fn test_release_item() {
        let group = fixtures::group(Uuid::new_v4(), false);
        let item = fixtures::item(&group, ItemType::Returnable, 0);
        assert!(item.is_assigned);

        let released = release_item(item, 1);
        assert_eq!(released.quantity, 1);
        assert!(!released.is_assigned);
    }

    #[test]
    fn test_acknowledge_pending_grant() {
        let lent = lent(ItemType::Returnable, ApprovalStatus::Pending);
        let now = fixtures::now();

        let acknowledged = acknowledge(&lent.holder, lent.approval, now).unwrap();
        assert_eq!(acknowledged.status, ApprovalStatus::Acknowledged);
        assert_eq!(acknowledged.current_status_date, now);
    }

    #[test]
    fn test_acknowledge_twice_fails() {
        let lent = lent(ItemType::Returnable, ApprovalStatus::Acknowledged);
        assert_eq!(
            acknowledge(&lent.holder, lent.approval, fixtures::now()),
            Err(LendingError::AcknowledgeNotAllowed)
        );
    }

    #[test]
    fn test_acknowledge_by_other_user_fails() {
        let lent = lent(ItemType::Returnable, ApprovalStatus::Pending);
        let stranger = context(lent.holder.organization_id, Role::Admin);
        assert_eq!(
            acknowledge(&stranger, lent.approval, fixtures::now()),
            Err(LendingError::NotFound("approved item"))
        );
    }

    #[test]
    fn test_return_acknowledged_grant() {
        let lent = lent(ItemType::Returnable, ApprovalStatus::Acknowledged);
        let now = fixtures::now();

        let outcome =
            return_item(&lent.holder, lent.approval, lent.item, &lent.group, 1, now).unwrap();
        assert_eq!(outcome.approval.status, ApprovalStatus::Returned);
        assert_eq!(outcome.approval.current_status_date, now);
        assert_eq!(outcome.item.quantity, 1);
        assert!(!outcome.item.is_assigned);
    }

    #[test]
    fn test_return_requires_acknowledgement() {
        for status in [ApprovalStatus::Pending, ApprovalStatus::Returned] {
            let lent = lent(ItemType::Shareable, status);
            assert_eq!(
                return_item(
                    &lent.holder,
                    lent.approval,
                    lent.item,
                    &lent.group,
                    1,
                    fixtures::now()
                ),
                Err(LendingError::ReturnNotAllowed)
            );
        }
    }

    #[test]
    fn test_permanent_and_accessory_items_are_not_returned() {
        let lent_permanent = lent(ItemType::Permanent, ApprovalStatus::Acknowledged);
        assert_eq!(
            return_item(
                &lent_permanent.holder,
                lent_permanent.approval,
                lent_permanent.item,
                &lent_permanent.group,
                1,
                fixtures::now()
            ),
            Err(LendingError::ReturnPermanentItem)
        );

        let mut lent_accessory = lent(ItemType::Returnable, ApprovalStatus::Acknowledged);
        lent_accessory.group.is_accessory = true;
        assert_eq!(
            return_item(
                &lent_accessory.holder,
                lent_accessory.approval,
                lent_accessory.item,
                &lent_accessory.group,
                1,
                fixtures::now()
            ),
            Err(LendingError::ReturnPermanentItem)
        );
    }
}

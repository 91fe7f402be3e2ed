//! Inventory management rules for item groups and items.

use super::error::LendingError;
use super::policy::{ensure_same_org, require_inventory_manager};
use crate::models::item::{CreateItemRequest, UpdateItemRequest};
use crate::models::item_group::{CreateItemGroupRequest, UpdateItemGroupRequest};
use crate::models::{Item, ItemGroup, ItemType, NewItem, NewItemGroup, UserContext};

/// Validates a new item group for the caller's organization.
///
/// Name uniqueness is enforced by the store.
pub fn new_item_group(
    actor: &UserContext,
    payload: CreateItemGroupRequest,
) -> Result<NewItemGroup, LendingError> {
    require_inventory_manager(actor)?;

    Ok(NewItemGroup {
        name: payload.name.trim().to_string(),
        organization_id: actor.organization_id,
        added_by: Some(actor.id),
        is_accessory: payload.is_accessory,
    })
}

pub fn rename_item_group(
    actor: &UserContext,
    mut group: ItemGroup,
    payload: UpdateItemGroupRequest,
) -> Result<ItemGroup, LendingError> {
    require_inventory_manager(actor)?;
    ensure_same_org(actor, group.organization_id)?;

    group.name = payload.name.trim().to_string();
    Ok(group)
}

/// Refuses to delete a group while any of its non-permanent items is lent out.
pub fn ensure_item_group_deletable(
    actor: &UserContext,
    group: &ItemGroup,
    assigned_lendable_items: i64,
) -> Result<(), LendingError> {
    require_inventory_manager(actor)?;
    ensure_same_org(actor, group.organization_id)?;

    if assigned_lendable_items > 0 {
        return Err(LendingError::ItemGroupInUse);
    }
    Ok(())
}

/// Validates a new item for a group.
pub fn new_item(
    actor: &UserContext,
    group: &ItemGroup,
    payload: CreateItemRequest,
) -> Result<NewItem, LendingError> {
    require_inventory_manager(actor)?;
    ensure_same_org(actor, group.organization_id)?;

    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(LendingError::InvalidQuantity);
    }
    if group.is_accessory && payload.item_type != ItemType::Permanent {
        return Err(LendingError::InvalidItemAdd);
    }
    if !group.is_accessory && quantity != 1 {
        return Err(LendingError::QuantityNotAllowed);
    }

    Ok(NewItem {
        item_group_id: group.id,
        quantity,
        item_type: payload.item_type,
        attributes: payload.attributes,
    })
}

/// Applies an item update. Attribute replacement is carried out by the store.
///
/// Items lent out from a non-accessory group are frozen. Only accessory
/// quantities can be changed; restocking an exhausted accessory frees it.
pub fn update_item(
    actor: &UserContext,
    group: &ItemGroup,
    mut item: Item,
    payload: &UpdateItemRequest,
) -> Result<Item, LendingError> {
    require_inventory_manager(actor)?;
    ensure_same_org(actor, group.organization_id)?;

    if item.is_assigned && !group.is_accessory {
        return Err(LendingError::ItemUpdateNotAllowed);
    }

    if let Some(quantity) = payload.quantity {
        if quantity <= 0 {
            return Err(LendingError::InvalidQuantity);
        }
        if !group.is_accessory && quantity != item.quantity {
            return Err(LendingError::QuantityNotAllowed);
        }
        item.quantity = quantity;
        item.is_assigned = false;
    }

    Ok(item)
}

/// Refuses to delete an item that is lent out, unless it was given away for good.
pub fn ensure_item_deletable(
    actor: &UserContext,
    group: &ItemGroup,
    item: &Item,
) -> Result<(), LendingError> {
    require_inventory_manager(actor)?;
    ensure_same_org(actor, group.organization_id)?;

    if item.is_assigned && item.item_type != ItemType::Permanent {
        return Err(LendingError::ItemInUse);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::AttributeInput;
    use crate::models::user::fixtures::context;
    use crate::models::Role;
    use crate::services::fixtures;
    use uuid::Uuid;

    fn create_item(item_type: ItemType, quantity: Option<i32>) -> CreateItemRequest {
        CreateItemRequest {
            item_type,
            quantity,
            attributes: vec![AttributeInput {
                name: "Serial".to_string(),
                value: "SN-001".to_string(),
            }],
        }
    }

    #[test]
    fn test_new_item_group() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);

        let group = new_item_group(
            &admin,
            CreateItemGroupRequest {
                name: "  Laptop ".to_string(),
                is_accessory: false,
            },
        )
        .unwrap();

        assert_eq!(group.name, "Laptop");
        assert_eq!(group.organization_id, org);
        assert_eq!(group.added_by, Some(admin.id));
    }

    #[test]
    fn test_users_cannot_manage_catalog() {
        let org = Uuid::new_v4();
        let user = context(org, Role::User);
        let group = fixtures::group(org, false);

        assert_eq!(
            new_item_group(
                &user,
                CreateItemGroupRequest {
                    name: "Laptop".to_string(),
                    is_accessory: false,
                }
            ),
            Err(LendingError::InsufficientRole)
        );
        assert_eq!(
            new_item(&user, &group, create_item(ItemType::Returnable, None)),
            Err(LendingError::InsufficientRole)
        );
    }

    #[test]
    fn test_rename_other_organization_group() {
        let manager = context(Uuid::new_v4(), Role::Manager);
        let group = fixtures::group(Uuid::new_v4(), false);

        assert_eq!(
            rename_item_group(
                &manager,
                group,
                UpdateItemGroupRequest {
                    name: "Phones".to_string()
                }
            ),
            Err(LendingError::OrganizationMismatch)
        );
    }

    #[test]
    fn test_group_delete_guard() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let group = fixtures::group(org, false);

        assert!(ensure_item_group_deletable(&admin, &group, 0).is_ok());
        assert_eq!(
            ensure_item_group_deletable(&admin, &group, 2),
            Err(LendingError::ItemGroupInUse)
        );
    }

    #[test]
    fn test_new_item_rules() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let laptops = fixtures::group(org, false);
        let mice = fixtures::group(org, true);

        let laptop = new_item(&admin, &laptops, create_item(ItemType::Shareable, None)).unwrap();
        assert_eq!(laptop.quantity, 1);
        assert_eq!(laptop.attributes.len(), 1);

        assert_eq!(
            new_item(&admin, &laptops, create_item(ItemType::Shareable, Some(3))),
            Err(LendingError::QuantityNotAllowed)
        );
        assert_eq!(
            new_item(&admin, &mice, create_item(ItemType::Returnable, Some(3))),
            Err(LendingError::InvalidItemAdd)
        );
        assert_eq!(
            new_item(&admin, &mice, create_item(ItemType::Permanent, Some(0))),
            Err(LendingError::InvalidQuantity)
        );

        let mouse = new_item(&admin, &mice, create_item(ItemType::Permanent, Some(25))).unwrap();
        assert_eq!(mouse.quantity, 25);
    }

    #[test]
    fn test_update_assigned_item_refused() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let laptops = fixtures::group(org, false);
        let item = fixtures::item(&laptops, ItemType::Returnable, 0);

        assert_eq!(
            update_item(&admin, &laptops, item, &UpdateItemRequest::default()),
            Err(LendingError::ItemUpdateNotAllowed)
        );
    }

    #[test]
    fn test_restock_accessory() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let mice = fixtures::group(org, true);
        let item = fixtures::item(&mice, ItemType::Permanent, 0);
        assert!(item.is_assigned);

        let payload = UpdateItemRequest {
            quantity: Some(10),
            attributes: None,
        };
        let updated = update_item(&admin, &mice, item, &payload).unwrap();
        assert_eq!(updated.quantity, 10);
        assert!(!updated.is_assigned);
    }

    #[test]
    fn test_non_accessory_quantity_is_fixed() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let laptops = fixtures::group(org, false);
        let item = fixtures::item(&laptops, ItemType::Returnable, 1);

        let payload = UpdateItemRequest {
            quantity: Some(4),
            attributes: None,
        };
        assert_eq!(
            update_item(&admin, &laptops, item, &payload),
            Err(LendingError::QuantityNotAllowed)
        );
    }

    #[test]
    fn test_item_delete_guard() {
        let org = Uuid::new_v4();
        let admin = context(org, Role::Admin);
        let laptops = fixtures::group(org, false);

        let lent = fixtures::item(&laptops, ItemType::Returnable, 0);
        assert_eq!(
            ensure_item_deletable(&admin, &laptops, &lent),
            Err(LendingError::ItemInUse)
        );

        let given_away = fixtures::item(&laptops, ItemType::Permanent, 0);
        assert!(ensure_item_deletable(&admin, &laptops, &given_away).is_ok());

        let free = fixtures::item(&laptops, ItemType::Shareable, 1);
        assert!(ensure_item_deletable(&admin, &laptops, &free).is_ok());
    }
}

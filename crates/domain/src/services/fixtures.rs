//! Builders for engine tests.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{
    ApprovalStatus, ApprovedItem, Item, ItemGroup, ItemType, RequestStatus, RequestedItem,
};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn group(org: Uuid, is_accessory: bool) -> ItemGroup {
    let created = now() - Duration::days(30);
    ItemGroup {
        id: Uuid::new_v4(),
        name: if is_accessory { "Mouse" } else { "Laptop" }.to_string(),
        organization_id: org,
        added_by: None,
        is_accessory,
        created_at: created,
        updated_at: created,
    }
}

pub fn item(group: &ItemGroup, item_type: ItemType, quantity: i32) -> Item {
    let created = now() - Duration::days(30);
    Item {
        id: Uuid::new_v4(),
        item_group_id: group.id,
        quantity,
        item_type,
        is_assigned: quantity == 0,
        created_at: created,
        updated_at: created,
    }
}

pub fn request(
    group: &ItemGroup,
    requested_by: Uuid,
    item_type: ItemType,
    quantity: i32,
    duration: Option<i32>,
) -> RequestedItem {
    let created = now() - Duration::days(1);
    RequestedItem {
        id: Uuid::new_v4(),
        item_group_id: group.id,
        requested_by,
        item_type,
        quantity,
        requested_duration: duration,
        status: RequestStatus::Pending,
        current_status_date: created,
        created_at: created,
        updated_at: created,
    }
}

pub fn approval(
    request: &RequestedItem,
    item: &Item,
    approved_by: Uuid,
    status: ApprovalStatus,
) -> ApprovedItem {
    let created = now() - Duration::days(2);
    ApprovedItem {
        id: Uuid::new_v4(),
        request_id: request.id,
        approved_by,
        approved_to: request.requested_by,
        item_id: item.id,
        approved_duration: request.requested_duration,
        status,
        current_status_date: created,
        created_at: created,
        updated_at: created,
    }
}

//! Item history entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::item::ItemInfo;
use domain::models::item_history::ItemHistoryView;
use domain::models::user::UserInfo;
use domain::models::ItemHistory;
use sqlx::FromRow;
use uuid::Uuid;

use super::approved_item::ApprovalStatusDb;
use super::item::ItemTypeDb;
use super::user::UserRoleDb;

/// Database row mapping for the item_history table.
#[derive(Debug, Clone, FromRow)]
pub struct ItemHistoryEntity {
    pub id: Uuid,
    pub approved_id: Option<Uuid>,
    pub status: ApprovalStatusDb,
    pub created_at: DateTime<Utc>,
}

impl From<ItemHistoryEntity> for ItemHistory {
    fn from(entity: ItemHistoryEntity) -> Self {
        Self {
            id: entity.id,
            approved_id: entity.approved_id,
            status: entity.status.into(),
            created_at: entity.created_at,
        }
    }
}

/// History row joined with the grant, request, item and users.
#[derive(Debug, Clone, FromRow)]
pub struct ItemHistoryViewEntity {
    pub id: Uuid,
    pub approved_id: Uuid,
    pub status: ApprovalStatusDb,
    pub created_at: DateTime<Utc>,
    pub item_id: Uuid,
    pub item_group_id: Uuid,
    pub item_group_name: String,
    pub item_type: ItemTypeDb,
    pub quantity: i32,
    pub requested_duration: Option<i32>,
    pub approved_duration: Option<i32>,
    pub requested_at: DateTime<Utc>,
    pub approved_at: DateTime<Utc>,
    pub approved_by_id: Uuid,
    pub approved_by_name: String,
    pub approved_by_email: String,
    pub approved_by_role: UserRoleDb,
    pub approved_to_id: Uuid,
    pub approved_to_name: String,
    pub approved_to_email: String,
    pub approved_to_role: UserRoleDb,
}

impl From<ItemHistoryViewEntity> for ItemHistoryView {
    fn from(entity: ItemHistoryViewEntity) -> Self {
        Self {
            id: entity.id,
            approved_id: entity.approved_id,
            status: entity.status.into(),
            item: ItemInfo {
                id: entity.item_id,
                item_group_id: entity.item_group_id,
                item_group_name: entity.item_group_name,
                item_type: entity.item_type.into(),
            },
            approved_by: UserInfo {
                id: entity.approved_by_id,
                full_name: entity.approved_by_name,
                email: entity.approved_by_email,
                role: entity.approved_by_role.into(),
            },
            approved_to: UserInfo {
                id: entity.approved_to_id,
                full_name: entity.approved_to_name,
                email: entity.approved_to_email,
                role: entity.approved_to_role.into(),
            },
            quantity: entity.quantity,
            requested_duration: entity.requested_duration,
            approved_duration: entity.approved_duration,
            requested_at: entity.requested_at,
            approved_at: entity.approved_at,
            created_at: entity.created_at,
        }
    }
}

//! Approved item entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::approved_item::ApprovedItemView;
use domain::models::{ApprovalStatus, ApprovedItem, ItemAttribute};
use sqlx::FromRow;
use uuid::Uuid;

use super::item::ItemTypeDb;

/// Database enum for grant status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
pub enum ApprovalStatusDb {
    Pending,
    Acknowledged,
    Returned,
}

impl From<ApprovalStatusDb> for ApprovalStatus {
    fn from(status: ApprovalStatusDb) -> Self {
        match status {
            ApprovalStatusDb::Pending => ApprovalStatus::Pending,
            ApprovalStatusDb::Acknowledged => ApprovalStatus::Acknowledged,
            ApprovalStatusDb::Returned => ApprovalStatus::Returned,
        }
    }
}

impl From<ApprovalStatus> for ApprovalStatusDb {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Pending => ApprovalStatusDb::Pending,
            ApprovalStatus::Acknowledged => ApprovalStatusDb::Acknowledged,
            ApprovalStatus::Returned => ApprovalStatusDb::Returned,
        }
    }
}

/// Database row mapping for the approved_items table.
#[derive(Debug, Clone, FromRow)]
pub struct ApprovedItemEntity {
    pub id: Uuid,
    pub request_id: Uuid,
    pub approved_by: Uuid,
    pub approved_to: Uuid,
    pub item_id: Uuid,
    pub approved_duration: Option<i32>,
    pub status: ApprovalStatusDb,
    pub current_status_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApprovedItemEntity> for ApprovedItem {
    fn from(entity: ApprovedItemEntity) -> Self {
        Self {
            id: entity.id,
            request_id: entity.request_id,
            approved_by: entity.approved_by,
            approved_to: entity.approved_to,
            item_id: entity.item_id,
            approved_duration: entity.approved_duration,
            status: entity.status.into(),
            current_status_date: entity.current_status_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// A grant with the quantity of the request it was made for.
#[derive(Debug, Clone, FromRow)]
pub struct HeldShareEntity {
    #[sqlx(flatten)]
    pub approval: ApprovedItemEntity,
    pub quantity: i32,
}

/// Grant joined with item, group, request and users for listings.
#[derive(Debug, Clone, FromRow)]
pub struct ApprovedItemViewEntity {
    pub id: Uuid,
    pub request_id: Uuid,
    pub item_id: Uuid,
    pub item_group_id: Uuid,
    pub item_group_name: String,
    pub item_type: ItemTypeDb,
    pub quantity: i32,
    pub approved_duration: Option<i32>,
    pub status: ApprovalStatusDb,
    pub approved_by: Uuid,
    pub approved_by_name: String,
    pub approved_to: Uuid,
    pub approved_to_name: String,
    pub current_status_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovedItemViewEntity {
    /// Converts to the listing model with the item's attributes attached.
    pub fn into_view(self, item_attributes: Vec<ItemAttribute>) -> ApprovedItemView {
        ApprovedItemView {
            id: self.id,
            request_id: self.request_id,
            item_id: self.item_id,
            item_group_id: self.item_group_id,
            item_group_name: self.item_group_name,
            item_type: self.item_type.into(),
            quantity: self.quantity,
            approved_duration: self.approved_duration,
            status: self.status.into(),
            approved_by: self.approved_by,
            approved_by_name: self.approved_by_name,
            approved_to: self.approved_to,
            approved_to_name: self.approved_to_name,
            item_attributes,
            current_status_date: self.current_status_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row of a `GROUP BY status` count over grants.
#[derive(Debug, Clone, FromRow)]
pub struct ApprovalStatusCountEntity {
    pub status: ApprovalStatusDb,
    pub count: i64,
}

/// Reminder digest: how many grants one holder has waiting.
#[derive(Debug, Clone, FromRow)]
pub struct ReminderDigestEntity {
    pub email: String,
    pub first_name: String,
    pub count: i64,
}

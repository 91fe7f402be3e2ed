//! Requested item entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::requested_item::RequestedItemView;
use domain::models::{RequestStatus, RequestedItem};
use sqlx::FromRow;
use uuid::Uuid;

use super::item::ItemTypeDb;

/// Database enum for request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
pub enum RequestStatusDb {
    Pending,
    Approved,
    Cancelled,
    Rejected,
}

impl From<RequestStatusDb> for RequestStatus {
    fn from(status: RequestStatusDb) -> Self {
        match status {
            RequestStatusDb::Pending => RequestStatus::Pending,
            RequestStatusDb::Approved => RequestStatus::Approved,
            RequestStatusDb::Cancelled => RequestStatus::Cancelled,
            RequestStatusDb::Rejected => RequestStatus::Rejected,
        }
    }
}

impl From<RequestStatus> for RequestStatusDb {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending => RequestStatusDb::Pending,
            RequestStatus::Approved => RequestStatusDb::Approved,
            RequestStatus::Cancelled => RequestStatusDb::Cancelled,
            RequestStatus::Rejected => RequestStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the requested_items table.
#[derive(Debug, Clone, FromRow)]
pub struct RequestedItemEntity {
    pub id: Uuid,
    pub item_group_id: Uuid,
    pub requested_by: Uuid,
    pub item_type: ItemTypeDb,
    pub quantity: i32,
    pub requested_duration: Option<i32>,
    pub status: RequestStatusDb,
    pub current_status_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RequestedItemEntity> for RequestedItem {
    fn from(entity: RequestedItemEntity) -> Self {
        Self {
            id: entity.id,
            item_group_id: entity.item_group_id,
            requested_by: entity.requested_by,
            item_type: entity.item_type.into(),
            quantity: entity.quantity,
            requested_duration: entity.requested_duration,
            status: entity.status.into(),
            current_status_date: entity.current_status_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Request joined with its group and requester for listings.
#[derive(Debug, Clone, FromRow)]
pub struct RequestedItemViewEntity {
    pub id: Uuid,
    pub item_group_id: Uuid,
    pub item_group_name: String,
    pub item_type: ItemTypeDb,
    pub quantity: i32,
    pub requested_duration: Option<i32>,
    pub status: RequestStatusDb,
    pub requested_by: Uuid,
    pub requested_by_name: String,
    pub current_status_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RequestedItemViewEntity> for RequestedItemView {
    fn from(entity: RequestedItemViewEntity) -> Self {
        Self {
            id: entity.id,
            item_group_id: entity.item_group_id,
            item_group_name: entity.item_group_name,
            item_type: entity.item_type.into(),
            quantity: entity.quantity,
            requested_duration: entity.requested_duration,
            status: entity.status.into(),
            requested_by: entity.requested_by,
            requested_by_name: entity.requested_by_name,
            current_status_date: entity.current_status_date,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Row of a `GROUP BY status` count over requests.
#[derive(Debug, Clone, FromRow)]
pub struct RequestStatusCountEntity {
    pub status: RequestStatusDb,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_conversion() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Cancelled,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::from(RequestStatusDb::from(status)), status);
        }
    }
}

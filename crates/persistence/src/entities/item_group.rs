//! Item group entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::item_group::ItemGroupSummary;
use domain::models::ItemGroup;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the item_groups table.
#[derive(Debug, Clone, FromRow)]
pub struct ItemGroupEntity {
    pub id: Uuid,
    pub name: String,
    pub organization_id: Uuid,
    pub added_by: Option<Uuid>,
    pub is_accessory: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemGroupEntity> for ItemGroup {
    fn from(entity: ItemGroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            organization_id: entity.organization_id,
            added_by: entity.added_by,
            is_accessory: entity.is_accessory,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Item group with item counts for listings.
#[derive(Debug, Clone, FromRow)]
pub struct ItemGroupSummaryEntity {
    pub id: Uuid,
    pub name: String,
    pub organization_id: Uuid,
    pub added_by: Option<Uuid>,
    pub is_accessory: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_count: i64,
    pub available_count: i64,
}

impl From<ItemGroupSummaryEntity> for ItemGroupSummary {
    fn from(entity: ItemGroupSummaryEntity) -> Self {
        Self {
            group: ItemGroup {
                id: entity.id,
                name: entity.name,
                organization_id: entity.organization_id,
                added_by: entity.added_by,
                is_accessory: entity.is_accessory,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
            item_count: entity.item_count,
            available_count: entity.available_count,
        }
    }
}

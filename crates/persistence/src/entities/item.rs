//! Item and item attribute entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Item, ItemAttribute, ItemType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for item types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "item_type", rename_all = "lowercase")]
pub enum ItemTypeDb {
    Shareable,
    Returnable,
    Permanent,
}

impl From<ItemTypeDb> for ItemType {
    fn from(item_type: ItemTypeDb) -> Self {
        match item_type {
            ItemTypeDb::Shareable => ItemType::Shareable,
            ItemTypeDb::Returnable => ItemType::Returnable,
            ItemTypeDb::Permanent => ItemType::Permanent,
        }
    }
}

impl From<ItemType> for ItemTypeDb {
    fn from(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Shareable => ItemTypeDb::Shareable,
            ItemType::Returnable => ItemTypeDb::Returnable,
            ItemType::Permanent => ItemTypeDb::Permanent,
        }
    }
}

/// Database row mapping for the items table.
#[derive(Debug, Clone, FromRow)]
pub struct ItemEntity {
    pub id: Uuid,
    pub item_group_id: Uuid,
    pub quantity: i32,
    pub item_type: ItemTypeDb,
    pub is_assigned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemEntity> for Item {
    fn from(entity: ItemEntity) -> Self {
        Self {
            id: entity.id,
            item_group_id: entity.item_group_id,
            quantity: entity.quantity,
            item_type: entity.item_type.into(),
            is_assigned: entity.is_assigned,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the item_attributes table.
#[derive(Debug, Clone, FromRow)]
pub struct ItemAttributeEntity {
    pub id: Uuid,
    pub item_id: Uuid,
    pub name: String,
    pub value: String,
}

impl From<ItemAttributeEntity> for ItemAttribute {
    fn from(entity: ItemAttributeEntity) -> Self {
        Self {
            id: entity.id,
            item_id: entity.item_id,
            name: entity.name,
            value: entity.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_conversion() {
        for item_type in [ItemType::Shareable, ItemType::Returnable, ItemType::Permanent] {
            assert_eq!(ItemType::from(ItemTypeDb::from(item_type)), item_type);
        }
    }
}

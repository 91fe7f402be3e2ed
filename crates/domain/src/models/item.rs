//! Item and item attribute domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// How an item is lent out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Lent for a duration; the holder may pass it on to another user.
    Shareable,
    /// Lent for a duration and returned to the inventory.
    Returnable,
    /// Handed over for good.
    Permanent,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Shareable => "shareable",
            ItemType::Returnable => "returnable",
            ItemType::Permanent => "permanent",
        }
    }

    /// Shareable and returnable lendings carry a duration in days.
    pub fn requires_duration(&self) -> bool {
        !matches!(self, ItemType::Permanent)
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shareable" => Ok(ItemType::Shareable),
            "returnable" => Ok(ItemType::Returnable),
            "permanent" => Ok(ItemType::Permanent),
            _ => Err(format!("Unknown item type: {}", s)),
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A concrete item of an item group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Item {
    pub id: Uuid,
    pub item_group_id: Uuid,
    pub quantity: i32,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub is_assigned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A free-form name/value attribute of an item (serial number, model, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemAttribute {
    pub id: Uuid,
    pub item_id: Uuid,
    pub name: String,
    pub value: String,
}

/// A validated item ready to be stored, with its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub item_group_id: Uuid,
    pub quantity: i32,
    pub item_type: ItemType,
    pub attributes: Vec<AttributeInput>,
}

/// Item with its attributes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub attributes: Vec<ItemAttribute>,
}

/// Attribute supplied when creating or updating an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct AttributeInput {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,

    #[validate(length(max = 255, message = "Value must be at most 255 characters"))]
    pub value: String,
}

/// Request payload for adding an item to a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateItemRequest {
    #[serde(rename = "type")]
    pub item_type: ItemType,

    #[serde(default)]
    pub quantity: Option<i32>,

    #[serde(default)]
    #[validate(nested)]
    pub attributes: Vec<AttributeInput>,
}

/// Request payload for updating an item.
///
/// `attributes`, when present, replaces the full attribute set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub quantity: Option<i32>,

    #[serde(default)]
    #[validate(nested)]
    pub attributes: Option<Vec<AttributeInput>>,
}

/// Query parameters for listing the items of a group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListItemsQuery {
    #[serde(default, rename = "type")]
    pub item_type: Option<ItemType>,
    #[serde(default)]
    pub is_assigned: Option<bool>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
}

/// Brief item info embedded in approval and history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemInfo {
    pub id: Uuid,
    pub item_group_id: Uuid,
    pub item_group_name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

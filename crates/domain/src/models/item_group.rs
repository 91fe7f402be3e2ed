//! Item group domain models.
//!
//! A group is a catalog entry such as "Laptop" or "HDMI cable". Non-accessory
//! groups hold one item per physical unit; accessory groups hold permanent
//! items whose quantity counts units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Represents an item group in the inventory of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemGroup {
    pub id: Uuid,
    pub name: String,
    pub organization_id: Uuid,
    pub added_by: Option<Uuid>,
    pub is_accessory: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated item group ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemGroup {
    pub name: String,
    pub organization_id: Uuid,
    pub added_by: Option<Uuid>,
    pub is_accessory: bool,
}

/// Item group with inventory counts, used for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemGroupSummary {
    #[serde(flatten)]
    pub group: ItemGroup,
    pub item_count: i64,
    pub available_count: i64,
}

/// Request payload for creating an item group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateItemGroupRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,

    #[serde(default)]
    pub is_accessory: bool,
}

/// Request payload for renaming an item group.
///
/// `is_accessory` is fixed at creation since it decides how items are counted.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateItemGroupRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,
}

/// Query parameters for listing item groups.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListItemGroupsQuery {
    #[serde(default)]
    pub is_accessory: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
}

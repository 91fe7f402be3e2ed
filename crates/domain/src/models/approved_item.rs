//! Approved item (grant) domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::item::{ItemAttribute, ItemType};

/// Status of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Approved, not yet confirmed by the holder.
    Pending,
    /// Holder confirmed receipt.
    Acknowledged,
    Returned,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Acknowledged => "acknowledged",
            ApprovalStatus::Returned => "returned",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "acknowledged" => Ok(ApprovalStatus::Acknowledged),
            "returned" => Ok(ApprovalStatus::Returned),
            _ => Err(format!("Unknown approval status: {}", s)),
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An item granted against a request. Never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApprovedItem {
    pub id: Uuid,
    pub request_id: Uuid,
    pub approved_by: Uuid,
    pub approved_to: Uuid,
    pub item_id: Uuid,
    /// Days. Never set for permanent items.
    pub approved_duration: Option<i32>,
    pub status: ApprovalStatus,
    pub current_status_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A grant ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApprovedItem {
    pub request_id: Uuid,
    pub approved_by: Uuid,
    pub approved_to: Uuid,
    pub item_id: Uuid,
    pub approved_duration: Option<i32>,
    pub status: ApprovalStatus,
    pub current_status_date: DateTime<Utc>,
}

/// Request payload for approving a request with a given item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApproveRequest {
    #[serde(default)]
    pub approved_duration: Option<i32>,
}

/// Request payload for changing the duration of a grant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UpdateApprovalRequest {
    #[serde(default)]
    pub approved_duration: Option<i32>,
}

/// Grant listing row with item and user details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApprovedItemView {
    pub id: Uuid,
    pub request_id: Uuid,
    pub item_id: Uuid,
    pub item_group_id: Uuid,
    pub item_group_name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_duration: Option<i32>,
    pub status: ApprovalStatus,
    pub approved_by: Uuid,
    pub approved_by_name: String,
    pub approved_to: Uuid,
    pub approved_to_name: String,
    pub item_attributes: Vec<ItemAttribute>,
    pub current_status_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing grants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListApprovalsQuery {
    #[serde(default, rename = "type")]
    pub item_type: Option<ItemType>,
    #[serde(default)]
    pub status: Option<ApprovalStatus>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_status_display() {
        assert_eq!(ApprovalStatus::Pending.to_string(), "pending");
        assert_eq!(ApprovalStatus::Acknowledged.to_string(), "acknowledged");
        assert_eq!(ApprovalStatus::Returned.to_string(), "returned");
    }

    #[test]
    fn test_approval_status_parse() {
        assert_eq!(
            "Acknowledged".parse::<ApprovalStatus>().unwrap(),
            ApprovalStatus::Acknowledged
        );
        assert!("lost".parse::<ApprovalStatus>().is_err());
    }

    #[test]
    fn test_approve_request_allows_empty_body() {
        let req: ApproveRequest = serde_json::from_str("{}").unwrap();
        assert!(req.approved_duration.is_none());
    }
}

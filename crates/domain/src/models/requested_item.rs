//! Borrowing request domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::item::ItemType;

/// Status of a borrowing request.
///
/// Everything except `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Cancelled,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "cancelled" => Ok(RequestStatus::Cancelled),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's request to borrow from an item group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestedItem {
    pub id: Uuid,
    pub item_group_id: Uuid,
    pub requested_by: Uuid,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub quantity: i32,
    /// Days. Never set for permanent requests.
    pub requested_duration: Option<i32>,
    pub status: RequestStatus,
    pub current_status_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequestedItem {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// A validated request ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequestedItem {
    pub item_group_id: Uuid,
    pub requested_by: Uuid,
    pub item_type: ItemType,
    pub quantity: i32,
    pub requested_duration: Option<i32>,
    pub status: RequestStatus,
    pub current_status_date: DateTime<Utc>,
}

/// Request payload for creating a borrowing request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateRequestRequest {
    #[serde(rename = "type")]
    pub item_type: ItemType,

    #[serde(default)]
    pub quantity: Option<i32>,

    #[serde(default)]
    pub requested_duration: Option<i32>,
}

/// Request listing row with group and requester names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestedItemView {
    pub id: Uuid,
    pub item_group_id: Uuid,
    pub item_group_name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_duration: Option<i32>,
    pub status: RequestStatus,
    pub requested_by: Uuid,
    pub requested_by_name: String,
    pub current_status_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRequestsQuery {
    #[serde(default, rename = "type")]
    pub item_type: Option<ItemType>,
    #[serde(default)]
    pub status: Option<RequestStatus>,
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
    fn test_request_status_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_request_status_display() {
        assert_eq!(RequestStatus::Pending.to_string(), "pending");
        assert_eq!(RequestStatus::Cancelled.to_string(), "cancelled");
        assert_eq!("REJECTED".parse::<RequestStatus>().unwrap(), RequestStatus::Rejected);
    }

    #[test]
    fn test_create_request_deserialize() {
        let json = r#"{"type":"returnable","requested_duration":7}"#;
        let req: CreateRequestRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.item_type, ItemType::Returnable);
        assert_eq!(req.quantity, None);
        assert_eq!(req.requested_duration, Some(7));
    }

    #[test]
    fn test_list_query_parses_filters() {
        let query: ListRequestsQuery =
            serde_json::from_str(r#"{"type":"shareable","status":"pending"}"#).unwrap();
        assert_eq!(query.item_type, Some(ItemType::Shareable));
        assert_eq!(query.status, Some(RequestStatus::Pending));
    }
}

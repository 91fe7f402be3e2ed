//! Item history: the append-only trail of grant status changes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::approved_item::{ApprovalStatus, ApprovedItem};
use super::item::ItemInfo;
use super::user::UserInfo;

/// One recorded grant status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemHistory {
    pub id: Uuid,
    /// Cleared if the grant row is ever removed.
    pub approved_id: Option<Uuid>,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

/// A history entry to append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub approved_id: Uuid,
    pub status: ApprovalStatus,
}

impl From<&ApprovedItem> for StatusChange {
    fn from(approval: &ApprovedItem) -> Self {
        Self {
            approved_id: approval.id,
            status: approval.status,
        }
    }
}

/// History row joined with the grant, its request and the users involved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemHistoryView {
    pub id: Uuid,
    pub approved_id: Uuid,
    pub status: ApprovalStatus,
    pub item: ItemInfo,
    pub approved_by: UserInfo,
    pub approved_to: UserInfo,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_duration: Option<i32>,
    pub requested_at: DateTime<Utc>,
    pub approved_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for the item history listing.
///
/// Dates are inclusive and compared against the day the entry was recorded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ItemHistoryQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
}

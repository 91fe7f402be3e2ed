//! Status rollups for requests and grants.

use serde::{Deserialize, Serialize};

use super::approved_item::ApprovalStatus;
use super::requested_item::RequestStatus;

/// Which rows a stats query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsScope {
    /// Requests made by, or grants held by, the caller.
    Mine,
    /// Grants given by the caller.
    GrantedByMe,
    /// Everything in the caller's organization.
    Organization,
}

/// Request counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestStats {
    pub pending: i64,
    pub approved: i64,
    pub cancelled: i64,
    pub rejected: i64,
    pub total: i64,
}

impl RequestStats {
    /// Folds `(status, count)` rows into a rollup.
    pub fn from_counts<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (RequestStatus, i64)>,
    {
        rows.into_iter().fold(Self::default(), |mut stats, (status, count)| {
            match status {
                RequestStatus::Pending => stats.pending += count,
                RequestStatus::Approved => stats.approved += count,
                RequestStatus::Cancelled => stats.cancelled += count,
                RequestStatus::Rejected => stats.rejected += count,
            }
            stats.total += count;
            stats
        })
    }
}

/// Grant counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApprovalStats {
    pub pending: i64,
    pub acknowledged: i64,
    pub returned: i64,
    pub total: i64,
}

impl ApprovalStats {
    /// Folds `(status, count)` rows into a rollup.
    pub fn from_counts<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (ApprovalStatus, i64)>,
    {
        rows.into_iter().fold(Self::default(), |mut stats, (status, count)| {
            match status {
                ApprovalStatus::Pending => stats.pending += count,
                ApprovalStatus::Acknowledged => stats.acknowledged += count,
                ApprovalStatus::Returned => stats.returned += count,
            }
            stats.total += count;
            stats
        })
    }
}

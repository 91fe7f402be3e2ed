//! Reminder rules for grants waiting on their holder.

use chrono::{DateTime, Duration, Utc};

use super::notification::NotificationTemplate;
use crate::models::{ApprovalStatus, ApprovedItem, ItemType};

/// Picks the reminder to send for a single grant, regardless of its age.
///
/// Returns `None` for returned grants, which need no reminder.
pub fn reminder_for(approval: &ApprovedItem) -> Option<NotificationTemplate> {
    match approval.status {
        ApprovalStatus::Pending => Some(NotificationTemplate::AcknowledgeReminder),
        ApprovalStatus::Acknowledged => Some(NotificationTemplate::ReturnReminder),
        ApprovalStatus::Returned => None,
    }
}

/// When an acknowledged grant is due back, if it is ever due.
pub fn return_due_at(approval: &ApprovedItem, item_type: ItemType) -> Option<DateTime<Utc>> {
    if !item_type.requires_duration() || approval.status != ApprovalStatus::Acknowledged {
        return None;
    }
    approval
        .approved_duration
        .map(|days| approval.current_status_date + Duration::days(i64::from(days)))
}

pub fn is_overdue(approval: &ApprovedItem, item_type: ItemType, now: DateTime<Utc>) -> bool {
    return_due_at(approval, item_type).is_some_and(|due| due < now)
}

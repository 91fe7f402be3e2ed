//! Notification abstraction for lending emails.
//!
//! Delivery is fire-and-forget: the engines never wait on it and a failed
//! send never undoes a transition.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::UserContext;

/// Email templates sent by the lending core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    /// A request of the recipient was approved.
    RequestApproved,
    /// The recipient has approved items waiting for acknowledgement.
    AcknowledgeReminder,
    /// The recipient has approved items due for return.
    ReturnReminder,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::RequestApproved => "request_approved",
            NotificationTemplate::AcknowledgeReminder => "pending_acknowledge",
            NotificationTemplate::ReturnReminder => "pending_return",
        }
    }
}

impl std::fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message keyed by template, recipient and template variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    pub template: NotificationTemplate,
    pub recipient: String,
    pub variables: Value,
}

impl Notification {
    /// Tells the holder that their request was approved.
    pub fn request_approved(
        approver: &UserContext,
        recipient: &str,
        item_group_name: &str,
        quantity: i32,
    ) -> Self {
        Self {
            template: NotificationTemplate::RequestApproved,
            recipient: recipient.to_string(),
            variables: json!({
                "approver": {
                    "first_name": approver.first_name,
                    "full_name": approver.full_name(),
                    "email": approver.email,
                    "role": approver.role,
                },
                "organization_name": approver.organization_name,
                "item_group_name": item_group_name,
                "quantity": quantity,
            }),
        }
    }

    /// Reminds a holder of `count` grants waiting for acknowledgement.
    pub fn acknowledge_reminder(recipient: &str, name: &str, count: i64) -> Self {
        Self::reminder(NotificationTemplate::AcknowledgeReminder, recipient, name, count)
    }

    /// Reminds a holder of `count` grants due for return.
    pub fn return_reminder(recipient: &str, name: &str, count: i64) -> Self {
        Self::reminder(NotificationTemplate::ReturnReminder, recipient, name, count)
    }

    pub fn reminder(template: NotificationTemplate, recipient: &str, name: &str, count: i64) -> Self {
        Self {
            template,
            recipient: recipient.to_string(),
            variables: json!({
                "name": name,
                "count": count,
            }),
        }
    }
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was handed to the provider.
    Sent,
    /// Sending failed (but was non-blocking).
    Failed(String),
    /// Notification was skipped (e.g., email disabled).
    Skipped,
}

/// Notification service trait for sending lending emails.
#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, notification: Notification) -> NotificationResult;
}

/// Mock notification service for development and testing.
///
/// Logs and records notifications but doesn't actually send them.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationService {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: std::sync::Arc<std::sync::Mutex<Vec<Notification>>>,
}

impl MockNotificationService {
    /// Create a new mock notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock service that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Notifications accepted so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn send(&self, notification: Notification) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                template = %notification.template,
                recipient = %notification.recipient,
                "Mock notification service simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            template = %notification.template,
            recipient = %notification.recipient,
            "Mock: Would send notification"
        );

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
        NotificationResult::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures::context;
    use crate::models::Role;
    use uuid::Uuid;

    #[test]
    fn test_template_display() {
        assert_eq!(
            NotificationTemplate::RequestApproved.to_string(),
            "request_approved"
        );
        assert_eq!(
            NotificationTemplate::AcknowledgeReminder.to_string(),
            "pending_acknowledge"
        );
        assert_eq!(
            NotificationTemplate::ReturnReminder.to_string(),
            "pending_return"
        );
    }

    #[test]
    fn test_request_approved_variables() {
        let approver = context(Uuid::new_v4(), Role::Manager);
        let notification = Notification::request_approved(&approver, "holder@acme.test", "Laptop", 1);

        assert_eq!(notification.recipient, "holder@acme.test");
        assert_eq!(notification.variables["item_group_name"], "Laptop");
        assert_eq!(notification.variables["quantity"], 1);
        assert_eq!(notification.variables["approver"]["role"], "manager");
        assert_eq!(notification.variables["organization_name"], "Acme");
    }

    #[test]
    fn test_reminder_variables() {
        let notification = Notification::return_reminder("a@acme.test", "Ada", 3);
        assert_eq!(notification.template, NotificationTemplate::ReturnReminder);
        assert_eq!(notification.variables["count"], 3);
        assert_eq!(notification.variables["name"], "Ada");
    }

    #[tokio::test]
    async fn test_mock_notification_service_send() {
        let service = MockNotificationService::new();

        let result = service
            .send(Notification::acknowledge_reminder("a@acme.test", "Ada", 1))
            .await;

        assert_eq!(result, NotificationResult::Sent);
        assert_eq!(service.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_notification_service_failure() {
        let service = MockNotificationService::failing();

        let result = service
            .send(Notification::acknowledge_reminder("a@acme.test", "Ada", 1))
            .await;

        assert!(matches!(result, NotificationResult::Failed(_)));
        assert!(service.sent().is_empty());
    }
}

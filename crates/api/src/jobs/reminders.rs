//! Periodic lending reminders.
//!
//! Both jobs collapse matching grants into one email per holder carrying the
//! number of grants concerned.

use chrono::{Duration, Utc};
use domain::services::{Notification, NotificationResult, NotificationService};
use persistence::entities::ReminderDigestEntity;
use persistence::repositories::ApprovedItemRepository;
use sqlx::PgPool;
use std::sync::Arc;

use super::scheduler::{Job, JobFrequency};

/// Sends one reminder per digest row built by `build`.
///
/// Returns how many were handed to the provider. Individual failures are
/// logged and skipped.
pub async fn dispatch_digest(
    notifier: &dyn NotificationService,
    digest: Vec<ReminderDigestEntity>,
    build: fn(&str, &str, i64) -> Notification,
) -> usize {
    let mut sent = 0;
    for row in digest {
        let notification = build(&row.email, &row.first_name, row.count);
        let template = notification.template.as_str();
        match notifier.send(notification).await {
            NotificationResult::Sent => sent += 1,
            NotificationResult::Skipped => {}
            NotificationResult::Failed(reason) => {
                tracing::warn!(
                    template,
                    recipient = %row.email,
                    error = %reason,
                    "Reminder not delivered"
                );
            }
        }
    }
    sent
}

/// Chases holders who have not acknowledged a grant after `acknowledge_after`.
pub struct AcknowledgeReminderJob {
    approvals: ApprovedItemRepository,
    notifier: Arc<dyn NotificationService>,
    acknowledge_after: Duration,
    frequency: JobFrequency,
}

impl AcknowledgeReminderJob {
    pub fn new(
        pool: PgPool,
        notifier: Arc<dyn NotificationService>,
        acknowledge_after_hours: i64,
        interval_minutes: u64,
    ) -> Self {
        Self {
            approvals: ApprovedItemRepository::new(pool),
            notifier,
            acknowledge_after: Duration::hours(acknowledge_after_hours),
            frequency: JobFrequency::Minutes(interval_minutes),
        }
    }
}

#[async_trait::async_trait]
impl Job for AcknowledgeReminderJob {
    fn name(&self) -> &'static str {
        "acknowledge_reminders"
    }

    fn frequency(&self) -> JobFrequency {
        self.frequency
    }

    async fn execute(&self) -> Result<(), String> {
        let digest = self
            .approvals
            .pending_acknowledgement_digest(Utc::now() - self.acknowledge_after)
            .await
            .map_err(|e| format!("Failed to load pending acknowledgements: {}", e))?;

        let holders = digest.len();
        let sent = dispatch_digest(
            self.notifier.as_ref(),
            digest,
            Notification::acknowledge_reminder,
        )
        .await;
        tracing::info!(holders, sent, "Acknowledge reminders dispatched");
        Ok(())
    }
}

/// Chases holders whose grants are past their lending duration.
pub struct ReturnReminderJob {
    approvals: ApprovedItemRepository,
    notifier: Arc<dyn NotificationService>,
    frequency: JobFrequency,
}

impl ReturnReminderJob {
    pub fn new(pool: PgPool, notifier: Arc<dyn NotificationService>, interval_minutes: u64) -> Self {
        Self {
            approvals: ApprovedItemRepository::new(pool),
            notifier,
            frequency: JobFrequency::Minutes(interval_minutes),
        }
    }
}

#[async_trait::async_trait]
impl Job for ReturnReminderJob {
    fn name(&self) -> &'static str {
        "return_reminders"
    }

    fn frequency(&self) -> JobFrequency {
        self.frequency
    }

    async fn execute(&self) -> Result<(), String> {
        let digest = self
            .approvals
            .overdue_return_digest(Utc::now())
            .await
            .map_err(|e| format!("Failed to load overdue returns: {}", e))?;

        let holders = digest.len();
        let sent =
            dispatch_digest(self.notifier.as_ref(), digest, Notification::return_reminder).await;
        tracing::info!(holders, sent, "Return reminders dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::{MockNotificationService, NotificationTemplate};

    fn digest() -> Vec<ReminderDigestEntity> {
        vec![
            ReminderDigestEntity {
                email: "asha@example.com".to_string(),
                first_name: "Asha".to_string(),
                count: 2,
            },
            ReminderDigestEntity {
                email: "ravi@example.com".to_string(),
                first_name: "Ravi".to_string(),
                count: 1,
            },
        ]
    }

    #[tokio::test]
    async fn test_dispatch_sends_one_email_per_holder() {
        let notifier = MockNotificationService::new();

        let sent = dispatch_digest(&notifier, digest(), Notification::return_reminder).await;

        assert_eq!(sent, 2);
        let delivered = notifier.sent();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].template, NotificationTemplate::ReturnReminder);
        assert_eq!(delivered[0].recipient, "asha@example.com");
        assert_eq!(delivered[0].variables["count"], 2);
    }

    #[tokio::test]
    async fn test_dispatch_failures_are_not_counted() {
        let notifier = MockNotificationService::failing();

        let sent = dispatch_digest(&notifier, digest(), Notification::acknowledge_reminder).await;

        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn test_dispatch_empty_digest() {
        let notifier = MockNotificationService::new();
        assert_eq!(
            dispatch_digest(&notifier, Vec::new(), Notification::acknowledge_reminder).await,
            0
        );
    }
}

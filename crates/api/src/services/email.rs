//! Email delivery for lending notifications.
//!
//! Supported providers:
//! - `console`: logs emails (development)
//! - `sendgrid`: SendGrid v3 API

use async_trait::async_trait;
use domain::services::{Notification, NotificationResult, NotificationService, NotificationTemplate};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::EmailConfig;
use crate::middleware::metrics::record_notification;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Unknown email provider: {0}")]
    UnknownProvider(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Rendered email ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
}

/// Email-backed [`NotificationService`].
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Renders a notification into subject and body.
    pub fn render(&self, notification: &Notification) -> EmailMessage {
        let vars = &notification.variables;
        let (subject, body_text) = match notification.template {
            NotificationTemplate::RequestApproved => {
                let approver = text(&vars["approver"]["full_name"]);
                let group = text(&vars["item_group_name"]);
                let quantity = vars["quantity"].as_i64().unwrap_or(1);
                (
                    format!("Your request for {} was approved", group),
                    format!(
                        "Hi,\n\n{approver} approved your request for {quantity} x {group} at {org}.\n\n\
                         Please acknowledge receipt once you have the item:\n{link}\n\n\
                         {sender}",
                        approver = approver,
                        quantity = quantity,
                        group = group,
                        org = text(&vars["organization_name"]),
                        link = self.link("/my-approved"),
                        sender = self.config.sender_name,
                    ),
                )
            }
            NotificationTemplate::AcknowledgeReminder => (
                "Items waiting for your acknowledgement".to_string(),
                format!(
                    "Hi {name},\n\nYou have {count} approved item(s) you have not acknowledged yet.\n\
                     Please confirm receipt:\n{link}\n\n{sender}",
                    name = text(&vars["name"]),
                    count = vars["count"].as_i64().unwrap_or(0),
                    link = self.link("/my-approved?status=pending"),
                    sender = self.config.sender_name,
                ),
            ),
            NotificationTemplate::ReturnReminder => (
                "Items due for return".to_string(),
                format!(
                    "Hi {name},\n\n{count} item(s) you borrowed are past their lending period.\n\
                     Please return them:\n{link}\n\n{sender}",
                    name = text(&vars["name"]),
                    count = vars["count"].as_i64().unwrap_or(0),
                    link = self.link("/my-approved?status=acknowledged"),
                    sender = self.config.sender_name,
                ),
            ),
        };

        EmailMessage {
            to: notification.recipient.clone(),
            subject,
            body_text,
        }
    }

    fn link(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send an email message through the configured provider.
    pub async fn deliver(&self, message: EmailMessage) -> Result<(), EmailError> {
        match self.config.provider.as_str() {
            "console" => {
                self.send_console(&message);
                Ok(())
            }
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::UnknownProvider(provider.to_string()))
            }
        }
    }

    fn send_console(&self, message: &EmailMessage) {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body");
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = serde_json::json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{ "type": "text/plain", "value": message.body_text }]
        });

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

fn text(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

#[async_trait]
impl NotificationService for EmailService {
    async fn send(&self, notification: Notification) -> NotificationResult {
        let template = notification.template.as_str();
        if !self.config.enabled {
            debug!(
                template,
                recipient = %notification.recipient,
                "Email service disabled, skipping send"
            );
            record_notification(template, "skipped");
            return NotificationResult::Skipped;
        }

        let message = self.render(&notification);
        match self.deliver(message).await {
            Ok(()) => {
                record_notification(template, "sent");
                NotificationResult::Sent
            }
            Err(e) => {
                record_notification(template, "failed");
                error!(template, recipient = %notification.recipient, error = %e, "Email failed");
                NotificationResult::Failed(e.to_string())
            }
        }
    }
}

/// Sends a notification off the request path; the outcome is only logged.
pub fn dispatch(notifier: Arc<dyn NotificationService>, notification: Notification) {
    tokio::spawn(async move {
        if let NotificationResult::Failed(reason) = notifier.send(notification).await {
            tracing::warn!(error = %reason, "Notification dispatch failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{Role, UserContext};
    use uuid::Uuid;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sendgrid_api_key: String::new(),
            sender_email: "test@example.com".to_string(),
            sender_name: "Lending Desk".to_string(),
            base_url: "https://lending.example.com/".to_string(),
        }
    }

    fn approver() -> UserContext {
        UserContext {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            organization_name: "Acme".to_string(),
            role: Role::Manager,
            email: "meera@example.com".to_string(),
            first_name: "Meera".to_string(),
            last_name: "Iyer".to_string(),
            phone: Some("+919876543210".to_string()),
        }
    }

    #[test]
    fn test_render_request_approved() {
        let service = EmailService::new(test_config());
        let notification =
            Notification::request_approved(&approver(), "ravi@example.com", "Projectors", 2);

        let message = service.render(&notification);

        assert_eq!(message.to, "ravi@example.com");
        assert!(message.subject.contains("Projectors"));
        assert!(message.body_text.contains("Meera Iyer"));
        assert!(message.body_text.contains("2 x Projectors"));
        assert!(message
            .body_text
            .contains("https://lending.example.com/my-approved"));
    }

    #[test]
    fn test_render_reminders_carry_count() {
        let service = EmailService::new(test_config());

        let ack = service.render(&Notification::acknowledge_reminder("a@example.com", "Asha", 3));
        assert!(ack.body_text.contains("Hi Asha"));
        assert!(ack.body_text.contains("3 approved item(s)"));

        let ret = service.render(&Notification::return_reminder("a@example.com", "Asha", 1));
        assert_eq!(ret.subject, "Items due for return");
        assert!(ret.body_text.contains("1 item(s)"));
    }

    #[tokio::test]
    async fn test_send_console_email() {
        let service = EmailService::new(test_config());
        let result = service
            .send(Notification::return_reminder("a@example.com", "Asha", 1))
            .await;
        assert_eq!(result, NotificationResult::Sent);
    }

    #[tokio::test]
    async fn test_send_disabled_is_skipped() {
        let mut config = test_config();
        config.enabled = false;
        let service = EmailService::new(config);
        assert!(!service.is_enabled());

        let result = service
            .send(Notification::return_reminder("a@example.com", "Asha", 1))
            .await;
        assert_eq!(result, NotificationResult::Skipped);
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_fails() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);

        let result = service
            .send(Notification::acknowledge_reminder("a@example.com", "Asha", 1))
            .await;
        assert!(matches!(result, NotificationResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails() {
        let mut config = test_config();
        config.provider = "carrier-pigeon".to_string();
        let service = EmailService::new(config);

        let err = service
            .deliver(EmailMessage {
                to: "a@example.com".to_string(),
                subject: "s".to_string(),
                body_text: "b".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::UnknownProvider(_)));
    }
}

//! Mock email transport
//!
//! Captures messages in memory for tests and local development, with lookup
//! helpers for verification-code flows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EmailError, EmailMessage, EmailReceipt, EmailService};

/// Email captured by the mock service
#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub message: EmailMessage,
    pub receipt: EmailReceipt,
    pub captured_at: DateTime<Utc>,
}

impl CapturedEmail {
    /// Extract the verification code carried by this email, if any.
    pub fn verification_code(&self) -> Option<String> {
        self.message.metadata.get("code").cloned()
    }
}

/// Mock email service for testing
#[derive(Debug, Clone, Default)]
pub struct MockEmailService {
    emails: Arc<Mutex<Vec<CapturedEmail>>>,
    email_by_recipient: Arc<Mutex<HashMap<String, Vec<CapturedEmail>>>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured emails
    pub fn get_all_emails(&self) -> Vec<CapturedEmail> {
        self.emails.lock().unwrap().clone()
    }

    /// Get emails sent to a specific recipient
    pub fn get_emails_for_recipient(&self, email: &str) -> Vec<CapturedEmail> {
        self.email_by_recipient
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    /// Get the verification code from the most recent code email sent to a
    /// recipient.
    pub fn latest_code_for(&self, email: &str) -> Option<String> {
        self.get_emails_for_recipient(email)
            .into_iter()
            .filter(|e| {
                e.message
                    .metadata
                    .get("email_type")
                    .map(|t| t == "verification_code")
                    .unwrap_or(false)
            })
            .max_by_key(|e| e.captured_at)
            .and_then(|e| e.verification_code())
    }

    /// Get count of emails sent
    pub fn email_count(&self) -> usize {
        self.emails.lock().unwrap().len()
    }

    /// Clear all captured emails
    pub fn clear(&self) {
        self.emails.lock().unwrap().clear();
        self.email_by_recipient.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        tracing::debug!(to = %message.to, "mock email service capturing email");

        let receipt = EmailReceipt {
            message_id: format!("mock-{}", Uuid::new_v4()),
            sent_at: Utc::now(),
            provider: "mock".to_string(),
        };

        let captured = CapturedEmail {
            message: message.clone(),
            receipt: receipt.clone(),
            captured_at: Utc::now(),
        };

        self.emails.lock().unwrap().push(captured.clone());
        self.email_by_recipient
            .lock()
            .unwrap()
            .entry(message.to)
            .or_default()
            .push(captured);

        Ok(receipt)
    }

    fn default_from(&self) -> String {
        "no-reply@gatehouse.app".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_captures_emails() {
        let service = MockEmailService::new();

        let message = EmailMessage::new(
            "test@example.com".to_string(),
            "no-reply@gatehouse.app".to_string(),
            "Test Subject".to_string(),
            "Test body".to_string(),
        );

        let receipt = service.send_email(message).await.unwrap();
        assert!(receipt.message_id.starts_with("mock-"));
        assert_eq!(receipt.provider, "mock");
        assert_eq!(service.email_count(), 1);

        let emails = service.get_emails_for_recipient("test@example.com");
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].message.subject, "Test Subject");
    }

    #[tokio::test]
    async fn test_latest_code_lookup() {
        let service = MockEmailService::new();

        service
            .send_verification_code("a@b.com", "111111")
            .await
            .unwrap();
        service
            .send_verification_code("a@b.com", "222222")
            .await
            .unwrap();

        assert_eq!(service.latest_code_for("a@b.com"), Some("222222".to_string()));
        assert_eq!(service.latest_code_for("other@b.com"), None);
    }

    #[tokio::test]
    async fn test_clear_drops_captures() {
        let service = MockEmailService::new();
        service
            .send_verification_code("a@b.com", "111111")
            .await
            .unwrap();
        service.clear();
        assert_eq!(service.email_count(), 0);
        assert_eq!(service.latest_code_for("a@b.com"), None);
    }
}

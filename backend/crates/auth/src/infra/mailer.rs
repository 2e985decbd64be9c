//! Mailer Adapters
//!
//! `TracingMailer` logs instead of delivering (development default
//! until an SMTP/provider adapter is wired in). `RecordingMailer`
//! captures messages for assertions in tests.

use std::sync::{Arc, Mutex};

use crate::domain::repository::Mailer;
use crate::error::AuthResult;

/// Logs outbound mail at info level
#[derive(Debug, Clone, Default)]
pub struct TracingMailer;

impl Mailer for TracingMailer {
    async fn send_mail(&self, to: &str, subject: &str, _body: &str) -> AuthResult<()> {
        tracing::info!(to = %to, subject = %subject, "Mail sent (tracing adapter)");
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct RecordedMail {
    to: String,
    subject: String,
    body: String,
}

/// Captures outbound mail for test assertions
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<RecordedMail>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> usize {
        self.lock().len()
    }

    pub fn last_body(&self) -> Option<String> {
        self.lock().last().map(|m| m.body.clone())
    }

    pub fn last_recipient(&self) -> Option<String> {
        self.lock().last().map(|m| m.to.clone())
    }

    pub fn last_subject(&self) -> Option<String> {
        self.lock().last().map(|m| m.subject.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RecordedMail>> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Mailer for RecordingMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> AuthResult<()> {
        self.lock().push(RecordedMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_mailer_captures_messages() {
        let mailer = RecordingMailer::new();
        mailer
            .send_mail("user@example.com", "Hello", "Body text")
            .await
            .unwrap();
        assert_eq!(mailer.sent_count(), 1);
        assert_eq!(mailer.last_recipient().as_deref(), Some("user@example.com"));
        assert_eq!(mailer.last_subject().as_deref(), Some("Hello"));
        assert_eq!(mailer.last_body().as_deref(), Some("Body text"));
    }
}

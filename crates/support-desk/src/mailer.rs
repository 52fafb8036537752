//! Outgoing Mail
//!
//! The demo mailer accepts every message and writes it to the log.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Result, SupportError};
use crate::model::{Email, EmailReceipt};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<EmailReceipt>;
}

/// Logs messages instead of delivering them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<EmailReceipt> {
        if !email.to.contains('@') {
            return Err(SupportError::InvalidAddress(email.to.clone()));
        }

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");

        Ok(EmailReceipt {
            sent: true,
            message_id: format!("MSG-{}", Utc::now().timestamp_millis()),
            to: email.to.clone(),
            subject: email.subject.clone(),
        })
    }
}

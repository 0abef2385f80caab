// src/utils/mail.rs

use std::{
    fmt,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;

use crate::config::OTP_TTL_MINUTES;

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn verification_code(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your verification code".to_string(),
            body: format!(
                "Your verification code is {}. It expires in {} minutes.",
                code, OTP_TTL_MINUTES
            ),
        }
    }
}

#[derive(Debug)]
pub struct MailError(pub String);

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mail delivery failed: {}", self.0)
    }
}

impl std::error::Error for MailError {}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Writes outgoing mail to the log instead of delivering it.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            "{}",
            email.body
        );
        Ok(())
    }
}

/// Keeps every message in memory. Can be switched to fail on send.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<Email>>,
    failing: AtomicBool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Email> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    pub fn last_to(&self, to: &str) -> Option<Email> {
        self.sent().into_iter().rev().find(|e| e.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError("outbox rejected message".to_string()));
        }

        self.outbox
            .lock()
            .map_err(|e| MailError(e.to_string()))?
            .push(email);
        Ok(())
    }
}

//! Outbound transactional email. Delivery itself belongs to an external
//! provider; the server only depends on this trait.
use crate::error::AppError;
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: &Email) -> Result<(), AppError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<(), AppError> {
        info!(to = %email.to, subject = %email.subject, "[MAIL] {}", email.body);
        Ok(())
    }
}

/// Keeps every message in memory; can be switched to fail.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<Email>>,
    failing: Mutex<bool>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, email: &Email) -> Result<(), AppError> {
        if self.failing.lock().map(|f| *f).unwrap_or(false) {
            return Err(AppError::Mail("mail provider unavailable".into()));
        }
        self.sent
            .lock()
            .map_err(|_| AppError::Internal("mailer lock poisoned".into()))?
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email {
            to: "jane@example.com".into(),
            subject: "ShopIT Password Recovery".into(),
            body: "link".into(),
        }
    }

    #[test]
    fn memory_mailer_records_and_fails() {
        let mailer = MemoryMailer::default();
        mailer.send(&email()).unwrap();
        assert_eq!(mailer.sent(), vec![email()]);

        mailer.set_failing(true);
        assert!(matches!(mailer.send(&email()), Err(AppError::Mail(_))));
        assert_eq!(mailer.sent().len(), 1);
    }
}

//! Outgoing account email port.

use async_trait::async_trait;

/// Delivers account emails. Links are fully built by the caller.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, email: &str, link: &str) -> Result<(), MailError>;

    async fn send_password_reset(&self, email: &str, link: &str) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to deliver mail: {0}")]
    Delivery(String),
}

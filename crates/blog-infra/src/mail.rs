//! Mail delivery that writes to the log instead of an SMTP relay.

use async_trait::async_trait;

use blog_core::ports::{MailError, Mailer};

use crate::redact::mask_email;

/// Logs outgoing account mail. Links are only emitted at debug level since
/// they carry single-use tokens.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, email: &str, link: &str) -> Result<(), MailError> {
        tracing::info!(to = %mask_email(email), kind = "verification", "Sending account email");
        tracing::debug!(link, "Verification link");
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, link: &str) -> Result<(), MailError> {
        tracing::info!(to = %mask_email(email), kind = "password_reset", "Sending account email");
        tracing::debug!(link, "Password reset link");
        Ok(())
    }
}

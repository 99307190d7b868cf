use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::views::AuthorSummary;

/// User entity - represents a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    /// Avatar URL.
    pub image: Option<String>,
    pub password_hash: Option<String>,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user with generated ID and timestamps.
    pub fn new(email: String, username: Option<String>, password_hash: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            username,
            name: None,
            bio: None,
            image: None,
            password_hash,
            email_verified: false,
            verification_token: None,
            reset_token: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }

    pub fn issue_reset_token(&mut self, token: String, ttl: TimeDelta, now: DateTime<Utc>) {
        self.reset_token = Some(token);
        self.reset_token_expiry = Some(now + ttl);
        self.updated_at = now;
    }

    /// A reset token is only usable strictly before its expiry.
    pub fn reset_token_usable(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token, self.reset_token_expiry) {
            (Some(stored), Some(expiry)) => stored == token && now < expiry,
            _ => false,
        }
    }

    /// Replace the password hash and burn the reset token.
    pub fn complete_password_reset(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = Some(password_hash);
        self.reset_token = None;
        self.reset_token_expiry = None;
        self.updated_at = now;
    }

    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) {
        self.email_verified = true;
        self.verification_token = None;
        self.updated_at = now;
    }
}

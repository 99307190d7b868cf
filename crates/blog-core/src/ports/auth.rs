//! Authentication ports: session tokens and password hashing.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Identity, User};

/// Claims embedded in a session token. They let a request resolve its
/// identity without a store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Overwrite the fields present in `update`. Subject and timestamps are
    /// never touched.
    pub fn merge(&mut self, update: ClaimsUpdate) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(image) = update.image {
            self.image = image;
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: self.email.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Fields to merge into existing claims.
///
/// The outer `None` leaves a claim unchanged; `Some(None)` clears an
/// optional claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsUpdate {
    pub email: Option<String>,
    pub username: Option<Option<String>>,
    pub name: Option<Option<String>>,
    pub image: Option<Option<String>>,
}

impl ClaimsUpdate {
    /// Every profile field the token carries, as currently stored. Cleared
    /// profile fields clear the matching claim.
    pub fn from_profile(user: &User) -> Self {
        Self {
            email: Some(user.email.clone()),
            username: Some(user.username.clone()),
            name: Some(user.name.clone()),
            image: Some(user.image.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.name.is_none() && self.image.is_none()
    }
}

/// A signed token together with its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token service trait for signed session tokens.
pub trait TokenService: Send + Sync {
    /// Issue a fresh token for a user.
    fn issue(&self, user: &User) -> Result<IssuedToken, AuthError>;

    /// Validate and decode a token.
    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;

    /// Merge fields into a valid token's claims and re-sign it with the same
    /// subject, issue time and expiry.
    fn merge_claims(&self, token: &str, update: ClaimsUpdate) -> Result<IssuedToken, AuthError>;

    /// Lifetime of freshly issued tokens, in seconds.
    fn max_age_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> SessionClaims {
        SessionClaims {
            user_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            username: Some("alice".to_string()),
            name: Some("Alice".to_string()),
            image: None,
            issued_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            expires_at: DateTime::from_timestamp(1_702_592_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_merge_overwrites_only_present_fields() {
        let mut merged = claims();
        let original = merged.clone();

        merged.merge(ClaimsUpdate {
            username: Some(Some("alice2".to_string())),
            image: Some(Some("http://cdn/a.png".to_string())),
            ..Default::default()
        });

        assert_eq!(merged.username.as_deref(), Some("alice2"));
        assert_eq!(merged.image.as_deref(), Some("http://cdn/a.png"));
        assert_eq!(merged.email, original.email);
        assert_eq!(merged.name, original.name);
        assert_eq!(merged.user_id, original.user_id);
        assert_eq!(merged.expires_at, original.expires_at);
    }

    #[test]
    fn test_merge_clears_fields_set_to_none() {
        let mut merged = claims();

        merged.merge(ClaimsUpdate {
            username: Some(None),
            ..Default::default()
        });

        assert_eq!(merged.username, None);
        assert_eq!(merged.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_profile_update_mirrors_cleared_fields() {
        let mut user = User::new("alice@example.com".to_string(), None, None);
        user.name = Some("Alice".to_string());
        let mut merged = claims();

        merged.merge(ClaimsUpdate::from_profile(&user));

        assert_eq!(merged.username, None);
        assert_eq!(merged.name.as_deref(), Some("Alice"));
        assert_eq!(merged.image, None);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let base = claims();
        let mut merged = base.clone();

        merged.merge(ClaimsUpdate::default());

        assert_eq!(merged, base);
        assert!(ClaimsUpdate::default().is_empty());
    }
}

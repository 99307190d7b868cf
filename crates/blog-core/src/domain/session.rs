use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// Authenticated identity resolved from session claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of session resolution for one request. There is no partially
/// authenticated state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Authenticated(Identity),
    Anonymous,
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) => Some(identity),
            Session::Anonymous => None,
        }
    }

    /// The identity, or `Unauthorized` for anonymous callers.
    pub fn require(&self) -> Result<&Identity, DomainError> {
        self.identity().ok_or(DomainError::Unauthorized)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.identity().map(|identity| identity.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session_requires_login() {
        let result = Session::Anonymous.require();
        assert!(matches!(result, Err(DomainError::Unauthorized)));
    }

    #[test]
    fn test_authenticated_session_exposes_identity() {
        let identity = Identity {
            user_id: Uuid::new_v4(),
            email: "bob@example.com".to_string(),
            username: Some("bob".to_string()),
            name: None,
            image: None,
            expires_at: Utc::now(),
        };
        let session = Session::Authenticated(identity.clone());

        assert_eq!(session.require().unwrap(), &identity);
        assert_eq!(session.user_id(), Some(identity.user_id));
    }
}

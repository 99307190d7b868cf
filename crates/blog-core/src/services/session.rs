//! Session authority - binds signed tokens to identities.

use std::sync::Arc;

use crate::domain::{Session, User};
use crate::error::DomainError;
use crate::ports::{AuthError, ClaimsUpdate, IssuedToken, TokenService};

/// Issues, resolves and refreshes session tokens.
///
/// Claims are a cache of the user's profile. A token issued before a profile
/// edit keeps the old values until one of the merge paths below re-signs it.
pub struct SessionAuthority {
    tokens: Arc<dyn TokenService>,
}

impl SessionAuthority {
    pub fn new(tokens: Arc<dyn TokenService>) -> Self {
        Self { tokens }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, DomainError> {
        self.tokens.issue(user).map_err(token_failure)
    }

    /// Resolve the session for a request. A missing token is an anonymous
    /// session; a token that fails verification is returned as the error so
    /// the caller can log it before treating the request as anonymous.
    pub fn resolve(&self, token: Option<&str>) -> Result<Session, AuthError> {
        match token {
            None => Ok(Session::Anonymous),
            Some(token) => {
                let claims = self.tokens.verify(token)?;
                Ok(Session::Authenticated(claims.identity()))
            }
        }
    }

    /// Merge caller-supplied fields into the caller's token.
    ///
    /// Every supplied field must equal the stored profile value and the email
    /// claim cannot be merged this way.
    pub fn refresh(
        &self,
        token: &str,
        update: ClaimsUpdate,
        stored: &User,
    ) -> Result<IssuedToken, DomainError> {
        if update.email.is_some() {
            return Err(DomainError::Validation(
                "email cannot be changed through the session".to_string(),
            ));
        }
        let mismatch = |supplied: &Option<Option<String>>, stored: &Option<String>| {
            supplied.as_ref().is_some_and(|value| value != stored)
        };
        if mismatch(&update.username, &stored.username)
            || mismatch(&update.name, &stored.name)
            || mismatch(&update.image, &stored.image)
        {
            return Err(DomainError::Validation(
                "session fields must match the stored profile".to_string(),
            ));
        }

        self.merge(token, update, stored)
    }

    /// Merge the stored profile into the caller's token after a profile edit.
    pub fn sync_profile(&self, token: &str, user: &User) -> Result<IssuedToken, DomainError> {
        self.merge(token, ClaimsUpdate::from_profile(user), user)
    }

    pub fn max_age_seconds(&self) -> i64 {
        self.tokens.max_age_seconds()
    }

    fn merge(
        &self,
        token: &str,
        update: ClaimsUpdate,
        owner: &User,
    ) -> Result<IssuedToken, DomainError> {
        let claims = self.tokens.verify(token).map_err(token_failure)?;
        if claims.user_id != owner.id {
            return Err(DomainError::Forbidden);
        }
        self.tokens.merge_claims(token, update).map_err(token_failure)
    }
}

fn token_failure(err: AuthError) -> DomainError {
    match err {
        AuthError::TokenExpired | AuthError::InvalidToken(_) => DomainError::Unauthorized,
        other => DomainError::Internal(other.to_string()),
    }
}

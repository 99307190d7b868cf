//! Registration, login, email verification, password reset and profiles.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use crate::domain::{MediaKind, MediaUpload, Session, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{Mailer, PasswordService, UserRepository};

use super::media::MediaService;

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;

#[derive(Debug, Clone)]
pub struct AccountSettings {
    /// Base URL used to build links in outgoing mail.
    pub public_url: String,
    pub reset_token_ttl: TimeDelta,
    pub min_password_len: usize,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:8080".to_string(),
            reset_token_ttl: TimeDelta::hours(1),
            min_password_len: 8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Profile fields to change. `None` leaves a field as it is; a blank value
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    mailer: Arc<dyn Mailer>,
    media: Arc<MediaService>,
    settings: AccountSettings,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        mailer: Arc<dyn Mailer>,
        media: Arc<MediaService>,
        settings: AccountSettings,
    ) -> Self {
        Self {
            users,
            passwords,
            mailer,
            media,
            settings,
        }
    }

    /// Create an account. Duplicate email or username is rejected before
    /// anything is written.
    pub async fn register(&self, registration: Registration) -> Result<User, DomainError> {
        let email = normalize_email(&registration.email)?;
        let username = normalize_username(registration.username.as_deref())?;
        if let Some(password) = &registration.password {
            self.check_password(password)?;
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Duplicate { field: "email" });
        }
        if let Some(username) = &username {
            if self.users.find_by_username(username).await?.is_some() {
                return Err(DomainError::Duplicate { field: "username" });
            }
        }

        let password_hash = registration
            .password
            .map(|p| self.passwords.hash(&p))
            .transpose()
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let verification_token = random_token();
        let mut user = User::new(email, username, password_hash);
        user.verification_token = Some(verification_token.clone());

        // A concurrent registration can still win the unique index.
        let user = self.users.insert(user).await.map_err(|e| match e {
            RepoError::Constraint(message) => DomainError::Duplicate {
                field: duplicate_field(&message),
            },
            other => other.into(),
        })?;

        let link = self.link("/api/verify", &verification_token);
        self.mailer
            .send_verification(&user.email, &link)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(user)
    }

    /// Consume a verification token.
    pub async fn verify_email(&self, token: &str) -> Result<User, DomainError> {
        let invalid = || DomainError::Validation("Invalid token".to_string());
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid());
        }

        self.users
            .consume_verification_token(token, Utc::now())
            .await?
            .ok_or_else(invalid)
    }

    /// Check credentials. Every failure is the same `Unauthorized`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = normalize_email(email).map_err(|_| DomainError::Unauthorized)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::Unauthorized)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(DomainError::Unauthorized)?;

        let valid = self
            .passwords
            .verify(password, hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }
        Ok(user)
    }

    /// Issue a reset token and mail the link. Unknown emails succeed silently.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let email = normalize_email(email)?;
        let Some(mut user) = self.users.find_by_email(&email).await? else {
            return Ok(());
        };

        let token = random_token();
        user.issue_reset_token(token.clone(), self.settings.reset_token_ttl, Utc::now());
        let user = self.users.update(user).await?;

        let link = self.link("/reset-password", &token);
        self.mailer
            .send_password_reset(&user.email, &link)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    /// Set a new password if the token is known and not expired. The token is
    /// burned by the same write that stores the hash, so of two concurrent
    /// resets with one token only one succeeds.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), DomainError> {
        self.check_password(password)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::Validation("Invalid or expired token".to_string()));
        }

        let hash = self
            .passwords
            .hash(password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !self
            .users
            .consume_reset_token(token, Utc::now(), &hash)
            .await?
        {
            return Err(DomainError::Validation("Invalid or expired token".to_string()));
        }
        Ok(())
    }

    pub async fn profile(&self, session: &Session) -> Result<User, DomainError> {
        let identity = session.require()?;
        self.load(identity.user_id).await
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<User, DomainError> {
        let identity = session.require()?;
        let mut user = self.load(identity.user_id).await?;

        if let Some(raw) = update.username.as_deref() {
            let username = normalize_username(Some(raw))?;
            if let Some(username) = &username {
                if let Some(holder) = self.users.find_by_username(username).await? {
                    if holder.id != user.id {
                        return Err(DomainError::Duplicate { field: "username" });
                    }
                }
            }
            user.username = username;
        }
        if let Some(name) = update.name {
            user.name = non_blank(name);
        }
        if let Some(bio) = update.bio {
            user.bio = non_blank(bio);
        }
        if let Some(image) = update.image {
            user.image = non_blank(image);
        }
        user.updated_at = Utc::now();

        self.save(user).await
    }

    /// Store a new profile photo and point the user's avatar at it.
    pub async fn update_avatar(
        &self,
        session: &Session,
        upload: MediaUpload,
    ) -> Result<User, DomainError> {
        let identity = session.require()?;
        let stored = self.media.upload(session, upload, MediaKind::Avatar).await?;

        let mut user = self.load(identity.user_id).await?;
        user.image = Some(stored.url);
        user.updated_at = Utc::now();
        self.save(user).await
    }

    pub async fn purge_expired_reset_tokens(&self) -> Result<u64, DomainError> {
        Ok(self.users.clear_expired_reset_tokens(Utc::now()).await?)
    }

    async fn load(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    async fn save(&self, user: User) -> Result<User, DomainError> {
        let id = user.id;
        self.users.update(user).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::user_not_found(id),
            RepoError::Constraint(message) => DomainError::Duplicate {
                field: duplicate_field(&message),
            },
            other => other.into(),
        })
    }

    fn check_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.settings.min_password_len {
            return Err(DomainError::Validation(format!(
                "Password must be at least {} characters",
                self.settings.min_password_len
            )));
        }
        Ok(())
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!(
            "{}{}?token={}",
            self.settings.public_url.trim_end_matches('/'),
            path,
            token
        )
    }
}

/// Trim and lowercase; the stored form is what uniqueness applies to.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::Validation("Invalid email address".to_string())),
    }
}

/// Blank means "no username".
pub fn normalize_username(raw: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(username) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !USERNAME_LEN.contains(&username.len()) || !valid_chars {
        return Err(DomainError::Validation(
            "Username must be 3-32 characters of letters, digits, '_' or '-'".to_string(),
        ));
    }
    Ok(Some(username.to_string()))
}

/// Which unique field a constraint violation names. Index names carry the
/// column (`users_username_key`).
fn duplicate_field(message: &str) -> &'static str {
    if message.contains("username") {
        "username"
    } else {
        "email"
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// 244 bits of randomness from two v4 UUIDs, hex encoded.
fn random_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

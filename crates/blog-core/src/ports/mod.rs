//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod mailer;
mod media;
mod rate_limit;
mod repository;

pub use auth::{
    AuthError, ClaimsUpdate, IssuedToken, PasswordService, SessionClaims, TokenService,
};
pub use mailer::{MailError, Mailer};
pub use media::{MediaError, MediaStore};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{BaseRepository, PostRepository, UserRepository};

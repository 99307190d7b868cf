//! # Blog Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`.
//! This crate contains database, auth, media and mail integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No database driver or rate limiter, in-memory stores only
//! - `postgres` - PostgreSQL document tables via SeaORM
//! - `rate-limit` - Per-client rate limiting via governor

pub mod auth;
pub mod database;
pub mod mail;
pub mod media;
pub mod redact;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{DatabaseConfig, DatabaseConnections, InMemoryPostRepository, InMemoryUserRepository};
pub use mail::LogMailer;
pub use media::LocalMediaStore;

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresUserRepository};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

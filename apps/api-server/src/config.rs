//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::TimeDelta;

use blog_core::services::AccountSettings;
use blog_infra::database::DatabaseConfig;
use blog_infra::JwtConfig;

#[cfg(feature = "rate-limit")]
use blog_infra::RateLimitConfig;

#[cfg(feature = "scheduler")]
use crate::background::SchedulerConfig;

/// Where uploads are written and how they are addressed.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub dir: PathBuf,
    pub base_url: String,
    pub max_bytes: usize,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    /// Apply pending migrations before serving.
    pub auto_migrate: bool,
    pub jwt: JwtConfig,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,
    pub accounts: AccountSettings,
    pub media: MediaConfig,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[cfg(feature = "scheduler")]
    pub scheduler: SchedulerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            auto_migrate: false,
            jwt: JwtConfig::default(),
            cookie_secure: false,
            accounts: AccountSettings::default(),
            media: MediaConfig {
                dir: PathBuf::from("./uploads"),
                base_url: "http://localhost:8080/media".to_string(),
                max_bytes: 5 * 1024 * 1024,
            },
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::default(),
            #[cfg(feature = "scheduler")]
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(20),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(2),
        });

        let accounts = AccountSettings {
            public_url: env::var("PUBLIC_URL").unwrap_or(defaults.accounts.public_url),
            reset_token_ttl: parse_var("RESET_TOKEN_TTL_MINUTES")
                .map(TimeDelta::minutes)
                .unwrap_or(defaults.accounts.reset_token_ttl),
            ..defaults.accounts
        };

        let media = MediaConfig {
            dir: env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media.dir),
            base_url: env::var("MEDIA_BASE_URL").unwrap_or(defaults.media.base_url),
            max_bytes: parse_var("MEDIA_MAX_BYTES").unwrap_or(defaults.media.max_bytes),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            database,
            auto_migrate: flag("DB_AUTO_MIGRATE", false),
            jwt: JwtConfig::from_env(),
            cookie_secure: flag("COOKIE_SECURE", false),
            accounts,
            media,
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
            #[cfg(feature = "scheduler")]
            scheduler: SchedulerConfig::from_env(),
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

/// `false`/`0` disable, anything else enables.
pub(crate) fn flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(default)
}

//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{PasswordService, PostRepository, RateLimiter, UserRepository};
use blog_core::services::{AccountService, MediaService, PostService, SessionAuthority};
use blog_infra::database::DatabaseConnections;
use blog_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtTokenService,
    LocalMediaStore, LogMailer,
};

#[cfg(feature = "postgres")]
use blog_infra::{PostgresPostRepository, PostgresUserRepository};

#[cfg(feature = "rate-limit")]
use blog_infra::InMemoryRateLimiter;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub accounts: Arc<AccountService>,
    pub media: Arc<MediaService>,
    pub sessions: Arc<SessionAuthority>,
    pub db: Option<Arc<DatabaseConnections>>,
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    pub cookie_secure: bool,
    pub max_upload_bytes: usize,
    #[cfg(feature = "rate-limit")]
    pub(crate) limiter_store: Option<Arc<InMemoryRateLimiter>>,
}

/// Store backends the services run on.
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
            db: None,
        }
    }

    /// Connect to PostgreSQL when configured; otherwise, or when the
    /// connection fails, fall back to the in-memory stores.
    pub async fn connect(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    if config.auto_migrate {
                        run_migrations(&connections).await;
                    }
                    let conn = Arc::new(connections);
                    return Self {
                        users: Arc::new(PostgresUserRepository::new(conn.main.clone())),
                        posts: Arc::new(PostgresPostRepository::new(conn.main.clone())),
                        db: Some(conn),
                    };
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    return Self::in_memory();
                }
            }
        }

        if config.database.is_some() {
            tracing::warn!("Built without postgres feature. Ignoring DATABASE_URL.");
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }
        Self::in_memory()
    }
}

#[cfg(feature = "postgres")]
async fn run_migrations(connections: &DatabaseConnections) {
    use migration::{Migrator, MigratorTrait};

    match Migrator::up(&connections.main, None).await {
        Ok(()) => tracing::info!("Database migrations applied"),
        Err(e) => tracing::error!(error = %e, "Database migrations failed"),
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let stores = Stores::connect(config).await;
        Self::build(config, stores, Arc::new(Argon2PasswordService::new()))
    }

    /// Wire the services over the given stores.
    pub fn build(
        config: &AppConfig,
        stores: Stores,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        let media_store = Arc::new(LocalMediaStore::new(
            config.media.dir.clone(),
            config.media.base_url.clone(),
        ));
        let media = Arc::new(MediaService::new(media_store, config.media.max_bytes));

        let accounts = Arc::new(AccountService::new(
            stores.users.clone(),
            passwords,
            Arc::new(LogMailer::new()),
            media.clone(),
            config.accounts.clone(),
        ));
        let posts = Arc::new(PostService::new(stores.posts, stores.users));
        let sessions = Arc::new(SessionAuthority::new(Arc::new(JwtTokenService::new(
            config.jwt.clone(),
        ))));

        #[cfg(feature = "rate-limit")]
        let limiter_store = Some(Arc::new(InMemoryRateLimiter::new(
            config.rate_limit.clone(),
        )));
        #[cfg(feature = "rate-limit")]
        let rate_limiter = limiter_store
            .clone()
            .map(|limiter| limiter as Arc<dyn RateLimiter>);
        #[cfg(not(feature = "rate-limit"))]
        let rate_limiter = None;

        tracing::info!(
            database = stores.db.is_some(),
            rate_limited = rate_limiter.is_some(),
            "Application state initialized"
        );

        Self {
            posts,
            accounts,
            media,
            sessions,
            db: stores.db,
            rate_limiter,
            cookie_secure: config.cookie_secure,
            max_upload_bytes: config.media.max_bytes,
            #[cfg(feature = "rate-limit")]
            limiter_store,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory state with cheap password hashing and no rate limiter.
    pub fn for_tests() -> Self {
        let mut config = AppConfig::default();
        config.media.dir = std::env::temp_dir().join(format!("blog-api-{}", uuid::Uuid::new_v4()));
        config.media.max_bytes = 1024;

        let passwords = Arc::new(
            Argon2PasswordService::with_params(1024, 1, 1)
                .expect("valid argon2 parameters"),
        );
        let mut state = Self::build(&config, Stores::in_memory(), passwords);
        state.rate_limiter = None;
        state
    }
}

//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use quill_core::ports::{
    BlogRepository, Cache, PasswordService, RateLimiter, TokenService, UserRepository,
};
use quill_infra::cache::{InMemoryCache, NoopCache, RedisCache, RedisConfig};
use quill_infra::database::{
    DatabaseConfig, DatabaseConnections, InMemoryBlogRepository, InMemoryUserRepository,
    PostgresBlogRepository, PostgresUserRepository,
};
use quill_infra::rate_limit::{
    InMemoryRateLimiter, RateLimitConfig, RedisRateLimitConfig, RedisRateLimiter,
};
use quill_infra::{BcryptPasswordService, JwtConfig, JwtTokenService};

use crate::config::AppConfig;

const DB_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub blogs: Arc<dyn BlogRepository>,
    pub cache: Arc<dyn Cache>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let cache: Arc<dyn Cache> = match &config.redis {
            Some(redis_config) => match RedisCache::new(redis_config.clone()).await {
                Ok(redis) => Arc::new(redis),
                Err(e) if redis_config.fallback_to_memory => {
                    tracing::warn!(error = %e, "Redis unavailable, using in-memory cache");
                    Arc::new(InMemoryCache::new())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable, response caching disabled");
                    Arc::new(NoopCache)
                }
            },
            None => Arc::new(InMemoryCache::new()),
        };

        let (db, users, blogs): (
            Option<Arc<DatabaseConnections>>,
            Arc<dyn UserRepository>,
            Arc<dyn BlogRepository>,
        ) = match &config.database {
            Some(db_config) => {
                let conn = Arc::new(Self::connect_with_retry(db_config).await);
                (
                    Some(conn.clone()),
                    Arc::new(PostgresUserRepository::new(conn.main.clone())),
                    Arc::new(PostgresBlogRepository::new(conn.main.clone())),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running with in-memory repositories.");
                (
                    None,
                    Arc::new(InMemoryUserRepository::new()),
                    Arc::new(InMemoryBlogRepository::new()),
                )
            }
        };

        tracing::info!("Application state initialized");

        Self {
            users,
            blogs,
            cache,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(BcryptPasswordService::new(config.bcrypt_cost)),
            db,
        }
    }

    /// Retry the initial connection forever with a fixed backoff. The server
    /// is useless without its database, so there is nothing better to do
    /// than keep trying.
    async fn connect_with_retry(config: &DatabaseConfig) -> DatabaseConnections {
        loop {
            match DatabaseConnections::init(config).await {
                Ok(connections) => return connections,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Database connection failed, retrying in {}s",
                        DB_RETRY_BACKOFF.as_secs()
                    );
                    tokio::time::sleep(DB_RETRY_BACKOFF).await;
                }
            }
        }
    }

    /// Fully in-memory state for tests and local experiments.
    /// Uses a low bcrypt cost so test suites stay fast.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            blogs: Arc::new(InMemoryBlogRepository::new()),
            cache: Arc::new(InMemoryCache::new()),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "in-memory-secret".to_string(),
                expiration_days: 7,
            })),
            passwords: Arc::new(BcryptPasswordService::new(4)),
            db: None,
        }
    }
}

/// Pick the rate limiter backend. With Redis configured the counters are
/// shared across workers and instances; a failed connection falls back to
/// the per-process in-memory limiter so the API never runs uncapped.
pub async fn build_limiter(
    redis: Option<&RedisConfig>,
    limit: &RateLimitConfig,
    key_prefix: &str,
) -> Arc<dyn RateLimiter> {
    if let Some(redis) = redis {
        match RedisRateLimiter::new(RedisRateLimitConfig {
            redis: redis.clone(),
            max_requests: limit.max_requests,
            window: limit.window,
            key_prefix: key_prefix.to_string(),
        })
        .await
        {
            Ok(limiter) => return Arc::new(limiter),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, using in-memory rate limiter");
            }
        }
    }

    Arc::new(InMemoryRateLimiter::new(limit.clone()))
}

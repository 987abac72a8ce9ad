//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use quill_infra::cache::RedisConfig;
use quill_infra::database::DatabaseConfig;
use quill_infra::rate_limit::RateLimitConfig;
use quill_infra::JwtConfig;

const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Enables production-only behavior such as the HSTS header.
    pub production: bool,
    pub database: Option<DatabaseConfig>,
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
    /// Per-client cap on everything under /api.
    pub global_rate_limit: RateLimitConfig,
    /// Stricter per-client cap on login and register.
    pub auth_rate_limit: RateLimitConfig,
    pub cache_ttl: Duration,
    pub max_payload: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let global_rate_limit = RateLimitConfig::from_env();
        let auth_rate_limit = RateLimitConfig {
            max_requests: env::var("AUTH_RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            window: global_rate_limit.window,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            workers: env::var("WORKERS").ok().and_then(|w| w.parse().ok()),
            production: env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false),
            database: DatabaseConfig::from_env(),
            redis: env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env()),
            jwt: JwtConfig::from_env(),
            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(12),
            global_rate_limit,
            auth_rate_limit,
            cache_ttl: Duration::from_secs(
                env::var("CACHE_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_payload: env::var("MAX_PAYLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_PAYLOAD),
        }
    }
}

//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! database, cache, rate limiting, and authentication backends.

pub mod auth;
pub mod cache;
pub mod database;
pub mod rate_limit;

pub use auth::{BcryptPasswordService, JwtConfig, JwtTokenService};
pub use cache::{InMemoryCache, NoopCache, RedisCache, RedisConfig};
pub use database::{
    DatabaseConfig, DatabaseConnections, InMemoryBlogRepository, InMemoryUserRepository,
    PostgresBlogRepository, PostgresUserRepository,
};
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig, RedisRateLimitConfig, RedisRateLimiter};

//! Rate limiting implementations.

mod memory;
mod redis;

pub use memory::{InMemoryRateLimiter, RateLimitConfig};
pub use redis::{RedisRateLimitConfig, RedisRateLimiter};

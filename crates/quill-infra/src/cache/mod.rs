//! Cache implementations - Redis, in-memory fallback, and a no-op variant.

mod memory;
mod noop;
mod redis;

pub use memory::InMemoryCache;
pub use noop::NoopCache;
pub use redis::{RedisCache, RedisConfig};

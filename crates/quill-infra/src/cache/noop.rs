//! No-op cache for deployments that disable response caching.

use std::time::Duration;

use async_trait::async_trait;

use quill_core::ports::{Cache, CacheError};

/// Cache that stores nothing and always misses.
///
/// Lets the caching middleware stay wired in unconditionally while
/// the operator opts out of caching entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_misses() {
        let cache = NoopCache;
        cache.set("key", "value", None).await.unwrap();
        assert_eq!(cache.get("key").await, None);
        assert!(!cache.exists("key").await);
    }
}

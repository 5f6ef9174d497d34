use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::backend::{CacheBackend, CacheValue};
use crate::error::CacheError;

struct Entry {
    value: Arc<CacheValue>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process map with per-entry TTL. Expired entries are dropped lazily on
/// read and swept on every write.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn put(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        let entry = Entry {
            value: Arc::new(value),
            expires_at: ttl.filter(|t| !t.is_zero()).map(|t| now + t),
        };

        let mut entries = self.entries.write().await;
        entries.retain(|_, e| !e.is_expired(now));
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Arc<CacheValue>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it unless a writer replaced it meanwhile.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_types::node::WeightedNode;

    fn nodes(n: usize) -> CacheValue {
        CacheValue::WeightedNodes(vec![WeightedNode::default(); n])
    }

    #[tokio::test]
    async fn put_replaces_whole_value() {
        let cache = MemoryCache::new();
        cache.put("k", nodes(3), None).await.unwrap();
        cache.put("k", nodes(1), None).await.unwrap();

        let value = cache.get("k").await.unwrap().unwrap();
        assert_eq!(value.len(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = MemoryCache::new();
        assert!(cache.get("absent").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .put("short", nodes(1), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        cache.put("forever", nodes(1), None).await.unwrap();
        assert!(cache.get("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(cache.get("short").await.unwrap().is_none());
        assert!(cache.get("forever").await.unwrap().is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn zero_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.put("k", nodes(1), Some(Duration::ZERO)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get("k").await.unwrap().is_some());
    }
}

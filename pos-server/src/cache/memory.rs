//! In-process TTL cache backed by `DashMap`

use super::{Cache, CacheResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live (non-expired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let hit = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        // 过期条目惰性删除 (guard 已释放)
        if hit {
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new();
        cache
            .set("orders:1", b"payload".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("orders:1").await.unwrap(), Some(b"payload".to_vec()));
        assert_eq!(cache.len(), 1);

        cache.delete("orders:1").await.unwrap();
        assert_eq!(cache.get("orders:1").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache
            .set("orders:all", b"[]".to_vec(), Duration::from_millis(0))
            .await
            .unwrap();
        assert_eq!(cache.get("orders:all").await.unwrap(), None);
        assert!(cache.entries.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_entries() {
        let cache = MemoryCache::new();
        cache.set("a", vec![1], Duration::from_millis(0)).await.unwrap();
        cache.set("b", vec![2], Duration::from_secs(60)).await.unwrap();
        cache.purge_expired();
        assert_eq!(cache.entries.len(), 1);
        assert!(cache.entries.contains_key("b"));
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let cache = MemoryCache::new();
        assert!(cache.delete("nope").await.is_ok());
    }
}

//! Read-through order reader
//!
//! Sits outside every write transaction: writers call [`CachedOrderReader::invalidate`]
//! only after their commit, readers populate on miss. Cache failures are
//! logged and the store is used directly.

use super::{Cache, CacheError, keys};
use crate::db::repository::{RepoResult, order};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::OrderDetail;
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct CachedOrderReader {
    pool: SqlitePool,
    cache: Arc<dyn Cache>,
    ttl: Duration,
    /// 失效版本号: bumped on every invalidation; a populate only lands if
    /// no invalidation happened since its store read started
    version: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for CachedOrderReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedOrderReader")
            .field("cache", &self.cache)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CachedOrderReader {
    pub fn new(pool: SqlitePool, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            pool,
            cache,
            ttl,
            version: Arc::new(Mutex::new(0)),
        }
    }

    /// Every order, newest first
    pub async fn get_all(&self) -> RepoResult<Vec<OrderDetail>> {
        let pool = self.pool.clone();
        self.read_through(keys::ALL_ORDERS, || async move {
            order::find_all_details(&pool).await
        })
        .await
    }

    /// One order, `None` if it does not exist (misses are not cached)
    pub async fn get_one(&self, id: i64) -> RepoResult<Option<OrderDetail>> {
        let key = keys::order(id);
        if let Some(detail) = self.cached::<OrderDetail>(&key).await {
            return Ok(Some(detail));
        }

        let observed = *self.version.lock().await;
        let detail = order::find_detail(&self.pool, id).await?;
        if let Some(ref detail) = detail {
            self.populate(&key, detail, observed).await;
        }
        Ok(detail)
    }

    /// Drop the listing and the given orders' entries
    pub async fn invalidate(&self, order_ids: &[i64]) {
        let mut version = self.version.lock().await;
        *version += 1;

        let mut to_delete = vec![keys::ALL_ORDERS.to_string()];
        to_delete.extend(order_ids.iter().map(|id| keys::order(*id)));
        for key in &to_delete {
            if let Err(e) = self.cache.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
            }
        }
    }

    async fn read_through<T, F, Fut>(&self, key: &str, load: F) -> RepoResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RepoResult<T>>,
    {
        if let Some(value) = self.cached::<T>(key).await {
            return Ok(value);
        }

        let observed = *self.version.lock().await;
        let value = load().await?;
        self.populate(key, &value, observed).await;
        Ok(value)
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    tracing::debug!(key = %key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    if let Err(e) = self.cache.delete(key).await {
                        tracing::warn!(key = %key, error = %e, "Cache delete failed");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T, observed: u64) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                let e = CacheError::from(e);
                tracing::warn!(key = %key, error = %e, "Skipping cache populate");
                return;
            }
        };

        let version = self.version.lock().await;
        if *version != observed {
            tracing::debug!(key = %key, "Invalidated during read, not caching");
            return;
        }
        if let Err(e) = self.cache.set(key, bytes, self.ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache populate failed");
        }
    }
}

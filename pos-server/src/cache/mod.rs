//! 订单读缓存
//!
//! The store is the source of truth; the cache only ever holds serialized
//! read views and is invalidated by explicit deletes after a commit.
//!
//! ```text
//! get_orders / get_order
//!   └─ CachedOrderReader ─ hit ─→ Cache::get
//!                         └ miss → SQLite → Cache::set (ttl)
//!
//! place / update / delete (after commit)
//!   └─ CachedOrderReader::invalidate → Cache::delete
//! ```

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod reader;

pub use memory::MemoryCache;
pub use reader::CachedOrderReader;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Byte-oriented key/value cache with per-entry TTL
#[async_trait]
pub trait Cache: Send + Sync + std::fmt::Debug {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;
}

/// Cache keys
pub mod keys {
    /// Listing of every order
    pub const ALL_ORDERS: &str = "orders:all";

    pub fn order(id: i64) -> String {
        format!("orders:{id}")
    }
}

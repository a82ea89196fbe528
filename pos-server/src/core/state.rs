//! 服务状态
//!
//! Wires the store, cache, audit pipeline and order engine together.

use std::sync::Arc;
use std::time::Duration;

use shared::error::{AppError, AppResult};

use super::Config;
use crate::audit::{AuditService, AuditWorker};
use crate::cache::{Cache, CachedOrderReader, MemoryCache};
use crate::db::DbService;
use crate::orders::{OrderService, OrderSettings};
use crate::utils::{Clock, SystemClock};

#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub cache: Arc<dyn Cache>,
    pub audit: Arc<AuditService>,
    pub orders: OrderService,
}

impl ServerState {
    /// 初始化服务器状态 (系统时钟)
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        Self::initialize_with_clock(config, Arc::new(SystemClock)).await
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录
    /// 2. 数据库 (迁移)
    /// 3. 缓存 (Redis 或内存)
    /// 4. 审计服务 + 后台 worker
    /// 5. 订单服务
    pub async fn initialize_with_clock(config: &Config, clock: Arc<dyn Clock>) -> AppResult<Self> {
        config.ensure_work_dir().map_err(|e| {
            AppError::with_message(
                shared::ErrorCode::ConfigError,
                format!("Failed to create work directory {}: {e}", config.work_dir),
            )
        })?;

        let db = DbService::new(&config.database_path).await?;
        let cache = Self::build_cache(config).await;
        Self::with_cache(config, db, cache, clock)
    }

    /// Assemble the state around an existing database and cache
    ///
    /// Spawns the audit worker, so this must run inside a Tokio runtime.
    pub fn with_cache(
        config: &Config,
        db: DbService,
        cache: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let (audit, audit_rx) = AuditService::new(db.pool.clone(), config.audit_buffer_size);
        tokio::spawn(AuditWorker::new(db.pool.clone()).run(audit_rx));

        let reader = CachedOrderReader::new(
            db.pool.clone(),
            cache.clone(),
            Duration::from_secs(config.cache_ttl_secs),
        );
        let orders = OrderService::new(
            db.pool.clone(),
            OrderSettings::from(config),
            clock,
            reader,
            audit.clone(),
        );

        tracing::info!(
            timezone = %config.timezone,
            cutoff = %config.business_day_cutoff,
            payment_policy = ?config.payment_policy,
            modifier_policy = ?config.modifier_policy,
            acting_user_policy = ?config.acting_user_policy,
            "Order engine ready"
        );

        Ok(Self {
            config: config.clone(),
            db,
            cache,
            audit,
            orders,
        })
    }

    #[cfg(feature = "redis")]
    async fn build_cache(config: &Config) -> Arc<dyn Cache> {
        if let Some(url) = &config.redis_url {
            match crate::cache::redis::RedisCache::connect(url).await {
                Ok(cache) => return Arc::new(cache),
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable, using in-memory cache");
                }
            }
        }
        Arc::new(MemoryCache::new())
    }

    #[cfg(not(feature = "redis"))]
    async fn build_cache(config: &Config) -> Arc<dyn Cache> {
        if config.redis_url.is_some() {
            tracing::warn!("REDIS_URL set but the `redis` feature is disabled, using in-memory cache");
        }
        Arc::new(MemoryCache::new())
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.db.pool
    }
}

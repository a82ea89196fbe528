//! 审计日志服务
//!
//! 写入通过 mpsc 通道交给 [`AuditWorker`](super::AuditWorker)，查询直接读 SQLite。

use std::sync::Arc;

use shared::error::AppResult;
use shared::models::{ActionType, LogWithUser};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::types::{AuditError, AuditLogRequest};
use crate::db::repository::log;

pub struct AuditService {
    pool: SqlitePool,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService")
            .field("capacity", &self.tx.capacity())
            .finish_non_exhaustive()
    }
}

impl AuditService {
    /// 创建审计服务，返回接收端交给 worker
    pub fn new(
        pool: SqlitePool,
        buffer_size: usize,
    ) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        (Arc::new(Self { pool, tx }), rx)
    }

    /// Enqueue an entry without waiting
    ///
    /// `created_at` comes from the caller's clock so the entry lines up with
    /// the change it records.
    pub fn try_log(
        &self,
        user_id: i64,
        message: impl Into<String>,
        action_type: ActionType,
        created_at: i64,
    ) -> Result<(), AuditError> {
        let req = AuditLogRequest {
            user_id,
            message: message.into(),
            action_type,
            created_at,
        };
        self.tx.try_send(req).map_err(|e| match e {
            TrySendError::Full(_) => AuditError::ChannelFull,
            TrySendError::Closed(_) => AuditError::ChannelClosed,
        })
    }

    /// Fire-and-forget: failures are logged, never returned
    pub fn log(
        &self,
        user_id: i64,
        message: impl Into<String>,
        action_type: ActionType,
        created_at: i64,
    ) {
        if let Err(e) = self.try_log(user_id, message, action_type, created_at) {
            tracing::warn!(user_id, action = %action_type, error = %e, "Dropping audit entry");
        }
    }

    /// All entries, newest first
    pub async fn list_logs(&self) -> AppResult<Vec<LogWithUser>> {
        Ok(log::find_all(&self.pool).await?)
    }

    /// Entries written by one user, newest first
    pub async fn list_logs_by_user(&self, user_id: i64) -> AppResult<Vec<LogWithUser>> {
        Ok(log::find_by_user(&self.pool, user_id).await?)
    }
}

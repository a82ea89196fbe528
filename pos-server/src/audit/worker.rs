//! 审计日志后台 Worker
//!
//! 从 mpsc 通道消费 AuditLogRequest，写入 SQLite。
//! 通道关闭时自动退出。

use sqlx::SqlitePool;
use tokio::sync::mpsc;

use super::types::{AuditError, AuditLogRequest};
use crate::db::repository::log;

pub struct AuditWorker {
    pool: SqlitePool,
}

impl AuditWorker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 运行 worker（阻塞直到通道关闭）
    pub async fn run(self, mut rx: mpsc::Receiver<AuditLogRequest>) {
        tracing::info!("Audit log worker started");

        while let Some(req) = rx.recv().await {
            match self.append(&req).await {
                Ok(id) => {
                    tracing::debug!(
                        audit_id = id,
                        user_id = req.user_id,
                        action = %req.action_type,
                        "Audit entry recorded"
                    );
                }
                Err(e) => {
                    tracing::error!(user_id = req.user_id, error = %e, "Failed to write audit entry");
                }
            }
        }

        tracing::info!("Audit log channel closed, worker stopping");
    }

    async fn append(&self, req: &AuditLogRequest) -> Result<i64, AuditError> {
        let id = log::insert(
            &self.pool,
            req.user_id,
            &req.message,
            req.action_type,
            req.created_at,
        )
        .await?;
        Ok(id)
    }
}

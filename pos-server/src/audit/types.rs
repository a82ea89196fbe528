//! 审计日志类型

use crate::db::repository::RepoError;
use shared::models::ActionType;
use thiserror::Error;

/// 发送到 AuditWorker 的日志请求
#[derive(Debug, Clone)]
pub struct AuditLogRequest {
    pub user_id: i64,
    pub message: String,
    pub action_type: ActionType,
    pub created_at: i64,
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit channel is full")]
    ChannelFull,

    #[error("Audit channel is closed")]
    ChannelClosed,

    #[error("Audit storage error: {0}")]
    Storage(#[from] RepoError),
}

//! 审计日志模块
//!
//! # 架构
//!
//! ```text
//! 订单变更 (commit 之后)
//!   └─ AuditService::log() → mpsc → AuditWorker → SQLite (logs 表)
//! ```
//!
//! - **Append-only**: 无更新/删除接口
//! - **Fire-and-forget**: 通道满或关闭时只记录 warn，从不阻塞订单响应

pub mod service;
pub mod types;
pub mod worker;

pub use service::AuditService;
pub use types::{AuditError, AuditLogRequest};
pub use worker::AuditWorker;

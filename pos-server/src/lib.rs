//! POS Server - 餐厅收银订单交易引擎
//!
//! # 模块结构
//!
//! ```text
//! pos-server/src/
//! ├── core/      # 配置、服务状态
//! ├── db/        # SQLite 连接池、迁移、repository
//! ├── orders/    # 定价、订单号、构建、持久化、找零
//! ├── cache/     # 读缓存 (内存 / Redis)
//! ├── audit/     # 审计日志
//! └── utils/     # 日志、营业日时间、时钟
//! ```

pub mod audit;
pub mod cache;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, ServerState};
pub use orders::{OrderError, OrderService};
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 加载 .env 并初始化日志，返回最终配置
pub fn setup_environment() -> anyhow::Result<Config> {
    // .env 不存在不是错误
    if let Err(e) = dotenv::dotenv()
        && !e.not_found()
    {
        anyhow::bail!("Failed to load .env: {e}");
    }

    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        config.is_production(),
        config.log_dir.as_deref(),
    );
    tracing::info!(environment = %config.environment, work_dir = %config.work_dir, "Environment loaded");
    Ok(config)
}

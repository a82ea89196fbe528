//! 核心模块 - 配置与服务状态

pub mod config;
pub mod state;

pub use config::{ActingUserPolicy, Config, ModifierPolicy, PaymentPolicy};
pub use state::ServerState;

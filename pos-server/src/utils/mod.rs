//! 工具模块 - 日志、营业日时间计算、时钟

pub mod clock;
pub mod logger;
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};

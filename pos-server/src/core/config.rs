use chrono::NaiveTime;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::time::{parse_cutoff, parse_timezone};

/// 付款不足时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentPolicy {
    /// Abort the transaction with `INSUFFICIENT_PAYMENT_ERROR`
    #[default]
    Reject,
    /// Commit and report a negative exchange
    Advisory,
}

impl FromStr for PaymentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "advisory" => Ok(Self::Advisory),
            other => Err(format!("unknown payment policy: {other}")),
        }
    }
}

/// 请求中引用了不存在的 modifier 时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifierPolicy {
    /// Fail with `MODIFIER_NOT_FOUND`
    #[default]
    Reject,
    /// Drop the unknown modifier from the line
    Ignore,
}

impl FromStr for ModifierPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown modifier policy: {other}")),
        }
    }
}

/// 操作人无法解析时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActingUserPolicy {
    /// Persist with no owner, warn, skip the audit entry
    #[default]
    Lenient,
    /// Fail with `USER_NOT_FOUND` before anything is written
    Strict,
}

impl FromStr for ActingUserPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown acting user policy: {other}")),
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | DATABASE_PATH | $WORK_DIR/pos.db | SQLite 文件 |
/// | ENVIRONMENT | development | 运行环境 |
/// | TIMEZONE | UTC | 餐厅时区 (IANA) |
/// | BUSINESS_DAY_CUTOFF | 03:00 | 营业日起始时间 |
/// | CACHE_TTL_SECS | 3600 | 缓存 TTL |
/// | REDIS_URL | - | Redis 缓存 (需 `redis` feature) |
/// | AUDIT_BUFFER_SIZE | 1024 | 审计通道容量 |
/// | PAYMENT_POLICY | reject | reject / advisory |
/// | MODIFIER_POLICY | reject | reject / ignore |
/// | ACTING_USER_POLICY | lenient | lenient / strict |
/// | ALLOW_EMPTY_ORDERS | true | 是否允许无明细订单 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 滚动日志目录 |
///
/// # 示例
///
/// ```ignore
/// TIMEZONE=America/Mexico_City PAYMENT_POLICY=advisory cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    pub database_path: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub timezone: String,
    pub business_day_cutoff: String,
    pub cache_ttl_secs: u64,
    pub redis_url: Option<String>,
    pub audit_buffer_size: usize,
    pub payment_policy: PaymentPolicy,
    pub modifier_policy: ModifierPolicy,
    pub acting_user_policy: ActingUserPolicy,
    pub allow_empty_orders: bool,
    pub log_level: String,
    pub log_dir: Option<String>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn policy_from_env<T>(key: &str) -> T
where
    T: FromStr<Err = String> + Default,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("{}: {}, using default", key, e);
            T::default()
        }),
        Err(_) => T::default(),
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| default_database_path(&work_dir));

        Self {
            database_path,
            work_dir,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone: std::env::var("TIMEZONE").unwrap_or_else(|_| "UTC".into()),
            business_day_cutoff: std::env::var("BUSINESS_DAY_CUTOFF")
                .unwrap_or_else(|_| "03:00".into()),
            cache_ttl_secs: env_or("CACHE_TTL_SECS", 3600),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            audit_buffer_size: env_or("AUDIT_BUFFER_SIZE", 1024),
            payment_policy: policy_from_env("PAYMENT_POLICY"),
            modifier_policy: policy_from_env("MODIFIER_POLICY"),
            acting_user_policy: policy_from_env("ACTING_USER_POLICY"),
            allow_empty_orders: env_or("ALLOW_EMPTY_ORDERS", true),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
        }
    }

    /// 使用自定义工作目录覆盖配置，数据库放在该目录下
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_path = default_database_path(&config.work_dir);
        config.redis_url = None;
        config
    }

    /// 确保工作目录存在
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        if let Some(parent) = PathBuf::from(&self.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// 业务时区
    pub fn tz(&self) -> Tz {
        parse_timezone(&self.timezone)
    }

    /// 营业日起始时间
    pub fn cutoff(&self) -> NaiveTime {
        parse_cutoff(&self.business_day_cutoff)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn default_database_path(work_dir: &str) -> String {
    PathBuf::from(work_dir)
        .join("pos.db")
        .to_string_lossy()
        .into_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!("reject".parse::<PaymentPolicy>(), Ok(PaymentPolicy::Reject));
        assert_eq!(" Advisory ".parse::<PaymentPolicy>(), Ok(PaymentPolicy::Advisory));
        assert!("maybe".parse::<PaymentPolicy>().is_err());

        assert_eq!("ignore".parse::<ModifierPolicy>(), Ok(ModifierPolicy::Ignore));
        assert_eq!("STRICT".parse::<ActingUserPolicy>(), Ok(ActingUserPolicy::Strict));
    }

    #[test]
    fn test_policy_defaults_fail_closed() {
        assert_eq!(PaymentPolicy::default(), PaymentPolicy::Reject);
        assert_eq!(ModifierPolicy::default(), ModifierPolicy::Reject);
        assert_eq!(ActingUserPolicy::default(), ActingUserPolicy::Lenient);
    }

    #[test]
    fn test_with_overrides_places_database_in_work_dir() {
        let config = Config::with_overrides("/tmp/pos-test");
        assert_eq!(config.work_dir, "/tmp/pos-test");
        assert!(config.database_path.ends_with("pos.db"));
        assert!(config.database_path.starts_with("/tmp/pos-test"));
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_tz_and_cutoff_accessors() {
        let mut config = Config::with_overrides("/tmp/pos-test");
        config.timezone = "America/Mexico_City".into();
        config.business_day_cutoff = "03:00".into();
        assert_eq!(config.tz(), Tz::America__Mexico_City);
        assert_eq!(config.cutoff(), NaiveTime::from_hms_opt(3, 0, 0).unwrap());
    }
}

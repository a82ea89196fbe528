//! 时间工具函数: 营业日计算
//!
//! A business day starts at a configurable cutoff (03:00 by default) in the
//! restaurant's time zone, not at midnight. Repositories only ever see `i64`
//! Unix millis; all zone conversion happens here.

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;

/// 日期 + cutoff 时间 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_cutoff_millis(date: NaiveDate, cutoff: NaiveTime, tz: Tz) -> i64 {
    let naive = date.and_time(cutoff);
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 解析 cutoff 时间字符串 (HH:MM)，失败返回 00:00
pub fn parse_cutoff(cutoff: &str) -> NaiveTime {
    NaiveTime::parse_from_str(cutoff, "%H:%M").unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to parse business_day_cutoff '{}': {}, falling back to 00:00",
            cutoff,
            e
        );
        NaiveTime::MIN
    })
}

/// 解析 IANA 时区名，失败返回 UTC
pub fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|e| {
        tracing::warn!("Failed to parse timezone '{}': {}, falling back to UTC", name, e);
        Tz::UTC
    })
}

/// 给定时刻所属营业日的起始日期 (业务时区)
///
/// 当地时间 < cutoff → 还在"昨天"的营业日
pub fn business_date_at(now_millis: i64, cutoff: NaiveTime, tz: Tz) -> NaiveDate {
    let now = DateTime::from_timestamp_millis(now_millis)
        .unwrap_or_default()
        .with_timezone(&tz);
    if now.time() < cutoff {
        (now - chrono::Duration::days(1)).date_naive()
    } else {
        now.date_naive()
    }
}

/// 营业日窗口 `[start, end)`，Unix millis
pub fn business_day_window(now_millis: i64, cutoff: NaiveTime, tz: Tz) -> (i64, i64) {
    let date = business_date_at(now_millis, cutoff, tz);
    let next = date.succ_opt().unwrap_or(date);
    (
        date_cutoff_millis(date, cutoff, tz),
        date_cutoff_millis(next, cutoff, tz),
    )
}

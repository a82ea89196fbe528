//! Order Number Allocator
//!
//! Numbers are 1-based per business day and derived from a count of the
//! orders already created in the window. Callers must run
//! [`OrderNumberAllocator::next_number`] and the order insert inside the same
//! `BEGIN IMMEDIATE` transaction; see [`crate::db::begin_immediate`].

use std::sync::Arc;

use chrono::NaiveTime;
use chrono_tz::Tz;
use sqlx::SqliteExecutor;

use super::error::OrderResult;
use crate::db::repository::order;
use crate::utils::Clock;
use crate::utils::time::business_day_window;

#[derive(Debug, Clone)]
pub struct OrderNumberAllocator {
    tz: Tz,
    cutoff: NaiveTime,
    clock: Arc<dyn Clock>,
}

impl OrderNumberAllocator {
    pub fn new(tz: Tz, cutoff: NaiveTime, clock: Arc<dyn Clock>) -> Self {
        Self { tz, cutoff, clock }
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Business-day window `[start, end)` containing `now_millis`
    pub fn window_at(&self, now_millis: i64) -> (i64, i64) {
        business_day_window(now_millis, self.cutoff, self.tz)
    }

    /// count(orders in window) + 1
    pub async fn next_number(
        &self,
        executor: impl SqliteExecutor<'_>,
        now_millis: i64,
    ) -> OrderResult<i64> {
        let (start, end) = self.window_at(now_millis);
        let count = order::count_in_window(executor, start, end).await?;
        Ok(count + 1)
    }

    /// Number of the latest order in the window, 0 when none
    pub async fn last_number(
        &self,
        executor: impl SqliteExecutor<'_>,
        now_millis: i64,
    ) -> OrderResult<i64> {
        let (start, end) = self.window_at(now_millis);
        Ok(order::last_number_in_window(executor, start, end)
            .await?
            .unwrap_or(0))
    }
}

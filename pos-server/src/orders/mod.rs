//! 订单交易引擎
//!
//! # 流程
//!
//! ```text
//! place_order(request)
//!   ├─ OrderBuilder::validate        (no I/O)
//!   ├─ BEGIN IMMEDIATE
//!   │   ├─ PriceResolver::resolve    (one batched SELECT per entity)
//!   │   ├─ OrderBuilder::build       (subtotals, total)
//!   │   ├─ OrderNumberAllocator      (count in business day + 1)
//!   │   ├─ persister::insert_aggregate
//!   │   └─ reconcile                 (exchange / INSUFFICIENT_PAYMENT_ERROR)
//!   ├─ COMMIT
//!   ├─ CachedOrderReader::invalidate
//!   └─ AuditService::log             (fire-and-forget)
//! ```
//!
//! Every mutating operation runs in a spawned task so a dropped caller never
//! interrupts a commit in flight.

pub mod builder;
pub mod error;
pub mod money;
pub mod numbering;
pub mod persister;
pub mod pricing;
pub mod reconcile;
pub mod service;

pub use builder::{OrderBuilder, OrderDraft, PricedLine};
pub use error::{OrderError, OrderResult, PersistStage};
pub use numbering::OrderNumberAllocator;
pub use pricing::{PriceResolver, PriceTable};
pub use reconcile::Reconciliation;
pub use service::OrderService;

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::core::{ActingUserPolicy, Config, ModifierPolicy, PaymentPolicy};

/// Engine settings derived from [`Config`]
#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub tz: Tz,
    pub cutoff: NaiveTime,
    pub payment_policy: PaymentPolicy,
    pub modifier_policy: ModifierPolicy,
    pub acting_user_policy: ActingUserPolicy,
    pub allow_empty_orders: bool,
}

impl From<&Config> for OrderSettings {
    fn from(config: &Config) -> Self {
        Self {
            tz: config.tz(),
            cutoff: config.cutoff(),
            payment_policy: config.payment_policy,
            modifier_policy: config.modifier_policy,
            acting_user_policy: config.acting_user_policy,
            allow_empty_orders: config.allow_empty_orders,
        }
    }
}

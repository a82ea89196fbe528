//! Order Service
//!
//! Public entry point of the engine. Returns `AppError` so a transport layer
//! can hand results straight to the caller.

use std::future::Future;
use std::sync::Arc;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    ActionType, OrderCreate, OrderDetail, OrderStatus, OrderUpdate, PlaceOrderResult, User,
};
use sqlx::SqlitePool;

use super::OrderSettings;
use super::builder::OrderBuilder;
use super::error::{OrderError, OrderResult, PersistStage};
use super::money::{to_decimal, to_f64};
use super::numbering::OrderNumberAllocator;
use super::persister;
use super::pricing::{PriceResolver, collect_ids};
use super::reconcile::{reconcile, reconcile_stored};
use crate::audit::AuditService;
use crate::cache::CachedOrderReader;
use crate::core::ActingUserPolicy;
use crate::db::begin_immediate;
use crate::db::repository::{RepoError, order, user};
use crate::utils::Clock;

#[derive(Clone, Debug)]
pub struct OrderService {
    inner: Arc<ServiceInner>,
}

#[derive(Debug)]
struct ServiceInner {
    pool: SqlitePool,
    settings: OrderSettings,
    resolver: PriceResolver,
    builder: OrderBuilder,
    numbering: OrderNumberAllocator,
    reader: CachedOrderReader,
    audit: Arc<AuditService>,
}

/// Run a mutation to completion on its own task
///
/// The caller may drop the returned future; the spawned task keeps running
/// until it commits or rolls back.
async fn run_detached<T, F>(fut: F) -> AppResult<T>
where
    T: Send + 'static,
    F: Future<Output = OrderResult<T>> + Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(e) => Err(OrderError::Task(e.to_string()).into()),
    }
}

fn fetch_failed(err: RepoError) -> AppError {
    tracing::error!(error = %err, "Failed to load orders");
    AppError::new(ErrorCode::OrderFetchFailed)
}

fn commit_failed(stage: PersistStage) -> impl FnOnce(sqlx::Error) -> OrderError {
    move |e| OrderError::Persist {
        stage,
        message: format!("commit: {e}"),
    }
}

/// `delivered_at` change implied by a status change
fn delivered_transition(
    current: OrderStatus,
    next: Option<OrderStatus>,
    now_millis: i64,
) -> Option<Option<i64>> {
    match next {
        Some(OrderStatus::Delivered) if current != OrderStatus::Delivered => Some(Some(now_millis)),
        Some(status) if status != OrderStatus::Delivered && current == OrderStatus::Delivered => {
            Some(None)
        }
        _ => None,
    }
}

impl OrderService {
    pub fn new(
        pool: SqlitePool,
        settings: OrderSettings,
        clock: Arc<dyn Clock>,
        reader: CachedOrderReader,
        audit: Arc<AuditService>,
    ) -> Self {
        let inner = ServiceInner {
            resolver: PriceResolver::new(settings.modifier_policy),
            builder: OrderBuilder::new(settings.allow_empty_orders),
            numbering: OrderNumberAllocator::new(settings.tz, settings.cutoff, clock),
            pool,
            settings,
            reader,
            audit,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn settings(&self) -> &OrderSettings {
        &self.inner.settings
    }

    /// Price, number and persist a new order; returns totals and exchange
    pub async fn place_order(
        &self,
        request: OrderCreate,
        acting_email: Option<&str>,
    ) -> AppResult<PlaceOrderResult> {
        let inner = self.inner.clone();
        let email = acting_email.map(str::to_owned);
        run_detached(async move { inner.place_order(request, email).await }).await
    }

    /// Update client info / status, and optionally replace lines or payments
    pub async fn update_order(
        &self,
        id: i64,
        update: OrderUpdate,
        acting_email: Option<&str>,
    ) -> AppResult<OrderDetail> {
        let inner = self.inner.clone();
        let email = acting_email.map(str::to_owned);
        run_detached(async move { inner.update_order(id, update, email).await }).await
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
        acting_email: Option<&str>,
    ) -> AppResult<OrderDetail> {
        let update = OrderUpdate {
            status: Some(status),
            ..Default::default()
        };
        self.update_order(id, update, acting_email).await
    }

    /// Hard delete; items, details and payments go with it
    pub async fn delete_order(&self, id: i64, acting_email: Option<&str>) -> AppResult<()> {
        let inner = self.inner.clone();
        let email = acting_email.map(str::to_owned);
        run_detached(async move { inner.delete_order(id, email).await }).await
    }

    /// Every order, newest first (read-through cache)
    pub async fn get_orders(&self) -> AppResult<Vec<OrderDetail>> {
        self.inner.reader.get_all().await.map_err(fetch_failed)
    }

    /// One order (read-through cache)
    pub async fn get_order(&self, id: i64) -> AppResult<OrderDetail> {
        self.inner
            .reader
            .get_one(id)
            .await
            .map_err(fetch_failed)?
            .ok_or_else(|| OrderError::OrderNotFound(id).into())
    }

    /// Number the next order would get right now (not reserved)
    pub async fn next_order_number(&self) -> AppResult<i64> {
        let now = self.inner.numbering.now_millis();
        Ok(self.inner.numbering.next_number(&self.inner.pool, now).await?)
    }

    /// Number of the latest order in the current business day, 0 if none
    pub async fn last_order_number(&self) -> AppResult<i64> {
        let now = self.inner.numbering.now_millis();
        Ok(self.inner.numbering.last_number(&self.inner.pool, now).await?)
    }
}

impl ServiceInner {
    async fn resolve_acting_user(&self, email: Option<&str>) -> OrderResult<Option<User>> {
        let found = match email {
            Some(email) => user::find_by_email(&self.pool, email).await?,
            None => None,
        };

        match (found, self.settings.acting_user_policy) {
            (Some(user), _) => Ok(Some(user)),
            (None, ActingUserPolicy::Strict) => {
                Err(OrderError::UserNotFound(email.unwrap_or_default().to_string()))
            }
            (None, ActingUserPolicy::Lenient) => {
                tracing::warn!(
                    email = email.unwrap_or("<none>"),
                    "Acting user not found, proceeding without owner or audit entry"
                );
                Ok(None)
            }
        }
    }

    fn audit(&self, user: Option<&User>, message: String, action: ActionType, now_millis: i64) {
        if let Some(user) = user {
            self.audit.log(user.id, message, action, now_millis);
        }
    }

    async fn place_order(
        &self,
        request: OrderCreate,
        acting_email: Option<String>,
    ) -> OrderResult<PlaceOrderResult> {
        self.builder.validate(&request)?;
        let acting_user = self.resolve_acting_user(acting_email.as_deref()).await?;
        let (meal_ids, modifier_ids) = collect_ids(&request.items);

        let mut tx = begin_immediate(&self.pool).await?;
        // 持有写锁之后取时间，保证 created_at 与提交顺序一致
        let now = self.numbering.now_millis();

        let prices = self
            .resolver
            .resolve(&mut *tx, &meal_ids, &modifier_ids)
            .await?;
        let draft = self.builder.build(&request, &prices)?;
        let order_number = self.numbering.next_number(&mut *tx, now).await?;
        let order_id = persister::insert_aggregate(
            &mut *tx,
            &draft,
            order_number,
            acting_user.as_ref().map(|u| u.id),
            now,
        )
        .await?;
        let settlement = reconcile(&draft.payments, draft.total, self.settings.payment_policy)?;

        tx.commit().await.map_err(commit_failed(PersistStage::Order))?;

        tracing::info!(
            order_id,
            order_number,
            total = draft.total_price(),
            exchange = settlement.exchange(),
            "Order placed"
        );

        self.reader.invalidate(&[order_id]).await;
        self.audit(
            acting_user.as_ref(),
            format!(
                "Created order #{order_number} (id {order_id}) for {}",
                draft.client_name
            ),
            ActionType::Create,
            now,
        );

        Ok(PlaceOrderResult {
            message: "Order created successfully".to_string(),
            order_id,
            order_number,
            exchange: settlement.exchange(),
            total_price: draft.total_price(),
            subtotals: draft.subtotals(),
        })
    }

    async fn update_order(
        &self,
        id: i64,
        update: OrderUpdate,
        acting_email: Option<String>,
    ) -> OrderResult<OrderDetail> {
        if let Some(items) = &update.items {
            self.builder.validate_lines(items)?;
        }
        if let Some(payments) = &update.payments {
            self.builder.validate_payments(payments)?;
        }
        if let Some(name) = &update.client_name
            && name.trim().is_empty()
        {
            return Err(OrderError::Validation("client name is required".into()));
        }
        let acting_user = self.resolve_acting_user(acting_email.as_deref()).await?;

        let mut tx = begin_immediate(&self.pool).await?;
        let now = self.numbering.now_millis();

        let existing = order::find_by_id(&mut *tx, id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;

        let mut total = to_decimal(existing.total_price);
        if let Some(items) = &update.items {
            let (meal_ids, modifier_ids) = collect_ids(items);
            let prices = self
                .resolver
                .resolve(&mut *tx, &meal_ids, &modifier_ids)
                .await?;
            let (lines, new_total) = self.builder.price_lines(items, &prices)?;
            persister::replace_lines(&mut *tx, id, &lines).await?;
            total = new_total;
        }
        if let Some(payments) = &update.payments {
            persister::replace_payments(&mut *tx, id, payments, now).await?;
        }
        if update.items.is_some() || update.payments.is_some() {
            let stored = order::payments_for(&mut *tx, id).await?;
            reconcile_stored(&stored, total, self.settings.payment_policy)?;
        }

        let header = order::OrderHeaderUpdate {
            client_name: update.client_name.as_deref().map(|s| s.trim().to_string()),
            client_phone: update.client_phone.as_deref().map(|s| s.trim().to_string()),
            status: update.status,
            delivered_at: delivered_transition(existing.status, update.status, now),
            total_price: Some(to_f64(total)),
            updated_at: now,
        };
        order::update_header(&mut *tx, id, &header)
            .await
            .map_err(OrderError::persist(PersistStage::Update))?;
        // 提交前在同一事务里读出视图，提交之后不再有可失败的读
        let detail = order::find_detail_in(&mut *tx, id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;

        tx.commit().await.map_err(commit_failed(PersistStage::Update))?;

        tracing::info!(order_id = id, total = to_f64(total), "Order updated");

        self.reader.invalidate(&[id]).await;
        let what = match update.status {
            Some(status) if update.items.is_none() && update.payments.is_none() => {
                format!("status → {status}")
            }
            _ => "details".to_string(),
        };
        self.audit(
            acting_user.as_ref(),
            format!("Updated order #{} (id {id}): {what}", existing.order_number),
            ActionType::Update,
            now,
        );

        Ok(detail)
    }

    async fn delete_order(&self, id: i64, acting_email: Option<String>) -> OrderResult<()> {
        let acting_user = self.resolve_acting_user(acting_email.as_deref()).await?;

        let mut tx = begin_immediate(&self.pool).await?;
        let now = self.numbering.now_millis();
        let existing = order::find_by_id(&mut *tx, id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;
        order::delete(&mut *tx, id)
            .await
            .map_err(OrderError::persist(PersistStage::Delete))?;
        tx.commit().await.map_err(commit_failed(PersistStage::Delete))?;

        tracing::info!(order_id = id, order_number = existing.order_number, "Order deleted");

        self.reader.invalidate(&[id]).await;
        self.audit(
            acting_user.as_ref(),
            format!("Deleted order #{} (id {id})", existing.order_number),
            ActionType::Delete,
            now,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivered_transition() {
        use OrderStatus::*;
        assert_eq!(delivered_transition(Pending, Some(Delivered), 7), Some(Some(7)));
        assert_eq!(delivered_transition(Delivered, Some(Pending), 7), Some(None));
        assert_eq!(delivered_transition(Delivered, Some(Cancelled), 7), Some(None));
        assert_eq!(delivered_transition(Delivered, Some(Delivered), 7), None);
        assert_eq!(delivered_transition(Pending, Some(Cancelled), 7), None);
        assert_eq!(delivered_transition(Pending, None, 7), None);
    }
}

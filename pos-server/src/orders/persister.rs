//! Transactional Persister
//!
//! Writes run on a connection borrowed from a caller-owned transaction. Each
//! step tags its failure with the step name; the caller drops the transaction
//! on error, which rolls everything back.

use shared::models::{OrderStatus, PaymentInput};
use sqlx::SqliteConnection;

use super::builder::{OrderDraft, PricedLine};
use super::error::{OrderError, OrderResult, PersistStage};
use super::money::to_f64;
use crate::db::repository::order::{self, NewOrder};

/// Insert order → items → item details → payments; returns the order id
pub async fn insert_aggregate(
    conn: &mut SqliteConnection,
    draft: &OrderDraft,
    order_number: i64,
    user_id: Option<i64>,
    now_millis: i64,
) -> OrderResult<i64> {
    let delivered_at = (draft.status == OrderStatus::Delivered).then_some(now_millis);
    let order_id = order::insert(
        &mut *conn,
        &NewOrder {
            order_number,
            status: draft.status,
            client_name: &draft.client_name,
            client_phone: &draft.client_phone,
            total_price: draft.total_price(),
            user_id,
            created_at: now_millis,
            delivered_at,
        },
    )
    .await
    .map_err(OrderError::persist(PersistStage::Order))?;

    insert_lines(&mut *conn, order_id, &draft.lines).await?;
    insert_payments(&mut *conn, order_id, &draft.payments, now_millis).await?;

    Ok(order_id)
}

/// Insert priced lines and their modifier links
pub async fn insert_lines(
    conn: &mut SqliteConnection,
    order_id: i64,
    lines: &[PricedLine],
) -> OrderResult<()> {
    for line in lines {
        let item_id = order::insert_item(
            &mut *conn,
            order_id,
            line.meal_id,
            line.quantity,
            line.unit_price,
            to_f64(line.subtotal),
        )
        .await
        .map_err(OrderError::persist(PersistStage::Items))?;

        for modifier_id in &line.modifier_ids {
            order::insert_item_detail(&mut *conn, item_id, *modifier_id)
                .await
                .map_err(OrderError::persist(PersistStage::ItemDetails))?;
        }
    }
    Ok(())
}

pub async fn insert_payments(
    conn: &mut SqliteConnection,
    order_id: i64,
    payments: &[PaymentInput],
    now_millis: i64,
) -> OrderResult<()> {
    for payment in payments {
        order::insert_payment(
            &mut *conn,
            order_id,
            payment.payment_method,
            payment.amount_given,
            now_millis,
        )
        .await
        .map_err(OrderError::persist(PersistStage::Payments))?;
    }
    Ok(())
}

/// Delete-then-reinsert every line of an order
pub async fn replace_lines(
    conn: &mut SqliteConnection,
    order_id: i64,
    lines: &[PricedLine],
) -> OrderResult<()> {
    order::delete_items(&mut *conn, order_id)
        .await
        .map_err(OrderError::persist(PersistStage::Update))?;
    insert_lines(conn, order_id, lines).await
}

/// Delete-then-reinsert every tender of an order
pub async fn replace_payments(
    conn: &mut SqliteConnection,
    order_id: i64,
    payments: &[PaymentInput],
    now_millis: i64,
) -> OrderResult<()> {
    order::delete_payments(&mut *conn, order_id)
        .await
        .map_err(OrderError::persist(PersistStage::Update))?;
    insert_payments(conn, order_id, payments, now_millis).await
}

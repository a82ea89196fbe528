//! Order Repository
//!
//! Row-level writes used by the order persister (always inside a caller-owned
//! transaction) and the joined read views served through the order cache.

use super::{RepoError, RepoResult};
use shared::models::{
    Order, OrderDetail, OrderItemView, OrderStatus, Payment, PaymentMethod, SelectedModifier,
};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use std::collections::HashMap;

const ORDER_COLUMNS: &str = "id, order_number, status, client_name, client_phone, total_price, user_id, created_at, delivered_at, updated_at";

/// Order header to insert
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: i64,
    pub status: OrderStatus,
    pub client_name: &'a str,
    pub client_phone: &'a str,
    pub total_price: f64,
    pub user_id: Option<i64>,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
}

/// Partial header update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct OrderHeaderUpdate {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub status: Option<OrderStatus>,
    /// `Some(x)` writes `x` (possibly NULL) into `delivered_at`
    pub delivered_at: Option<Option<i64>>,
    pub total_price: Option<f64>,
    pub updated_at: i64,
}

// =============================================================================
// Business-day numbering
// =============================================================================

/// Orders created in `[start, end)`
pub async fn count_in_window(
    executor: impl SqliteExecutor<'_>,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= ? AND created_at < ?")
            .bind(start_millis)
            .bind(end_millis)
            .fetch_one(executor)
            .await?;
    Ok(count)
}

/// Number of the most recent order created in `[start, end)`
pub async fn last_number_in_window(
    executor: impl SqliteExecutor<'_>,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<Option<i64>> {
    let number: Option<i64> = sqlx::query_scalar(
        "SELECT order_number FROM orders WHERE created_at >= ? AND created_at < ? ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(start_millis)
    .bind(end_millis)
    .fetch_optional(executor)
    .await?;
    Ok(number)
}

// =============================================================================
// Writes
// =============================================================================

pub async fn insert(conn: &mut SqliteConnection, order: &NewOrder<'_>) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (order_number, status, client_name, client_phone, total_price, user_id, created_at, delivered_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?7) RETURNING id",
    )
    .bind(order.order_number)
    .bind(order.status)
    .bind(order.client_name)
    .bind(order.client_phone)
    .bind(order.total_price)
    .bind(order.user_id)
    .bind(order.created_at)
    .bind(order.delivered_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    meal_id: i64,
    quantity: i64,
    unit_price: f64,
    subtotal: f64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO order_items (order_id, meal_id, quantity, unit_price, subtotal) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
    )
    .bind(order_id)
    .bind(meal_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(subtotal)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn insert_item_detail(
    conn: &mut SqliteConnection,
    order_item_id: i64,
    modifier_id: i64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO order_item_details (order_item_id, modifier_id) VALUES (?1, ?2) RETURNING id",
    )
    .bind(order_item_id)
    .bind(modifier_id)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn insert_payment(
    conn: &mut SqliteConnection,
    order_id: i64,
    payment_method: PaymentMethod,
    amount_given: f64,
    created_at: i64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO payments (order_id, payment_method, amount_given, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(order_id)
    .bind(payment_method)
    .bind(amount_given)
    .bind(created_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Remove every line of an order (details cascade)
pub async fn delete_items(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM order_items WHERE order_id = ?")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn delete_payments(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM payments WHERE order_id = ?")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected())
}

pub async fn update_header(
    conn: &mut SqliteConnection,
    id: i64,
    data: &OrderHeaderUpdate,
) -> RepoResult<()> {
    let (set_delivered, delivered_at) = match data.delivered_at {
        Some(value) => (true, value),
        None => (false, None),
    };

    let rows = sqlx::query(
        "UPDATE orders SET client_name = COALESCE(?1, client_name), client_phone = COALESCE(?2, client_phone), status = COALESCE(?3, status), delivered_at = CASE WHEN ?4 THEN ?5 ELSE delivered_at END, total_price = COALESCE(?6, total_price), updated_at = ?7 WHERE id = ?8",
    )
    .bind(&data.client_name)
    .bind(&data.client_phone)
    .bind(data.status)
    .bind(set_delivered)
    .bind(delivered_at)
    .bind(data.total_price)
    .bind(data.updated_at)
    .bind(id)
    .execute(conn)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}

/// Hard delete; items, details and payments cascade
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

// =============================================================================
// Reads
// =============================================================================

pub async fn find_by_id(executor: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Order>> {
    let order =
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
    Ok(order)
}

pub async fn payments_for(
    executor: impl SqliteExecutor<'_>,
    order_id: i64,
) -> RepoResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        "SELECT id, order_id, payment_method, amount_given, created_at FROM payments WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;
    Ok(payments)
}

/// One order with its lines, modifiers and payments
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    // 读事务: 多条查询看到同一个快照
    let mut tx = pool.begin().await?;
    let detail = find_detail_in(&mut tx, id).await?;
    tx.commit().await?;
    Ok(detail)
}

/// [`find_detail`] on a caller-owned connection or transaction
pub async fn find_detail_in(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<OrderDetail>> {
    let Some(order) = find_by_id(&mut *conn, id).await? else {
        return Ok(None);
    };
    let mut details = load_details(conn, vec![order], DetailScope::One(id)).await?;
    Ok(details.pop())
}

/// Every order, newest first, with lines, modifiers and payments
pub async fn find_all_details(pool: &SqlitePool) -> RepoResult<Vec<OrderDetail>> {
    let mut tx = pool.begin().await?;
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(&mut *tx)
    .await?;
    let details = load_details(&mut tx, orders, DetailScope::All).await?;
    tx.commit().await?;
    Ok(details)
}

/// Which orders the child-row queries cover
///
/// Never a bound id list: the listing grows past SQLite's variable limit.
#[derive(Debug, Clone, Copy)]
enum DetailScope {
    All,
    One(i64),
}

impl DetailScope {
    /// `WHERE` clause on an `order_id` column
    fn filter(&self, column: &str) -> String {
        match self {
            DetailScope::All => String::new(),
            DetailScope::One(_) => format!("WHERE {column} = ?"),
        }
    }

    fn bind_id(&self) -> Option<i64> {
        match self {
            DetailScope::All => None,
            DetailScope::One(id) => Some(*id),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    order_id: i64,
    meal_id: i64,
    meal_name: String,
    meal_clave: Option<String>,
    is_clave_applied: bool,
    quantity: i64,
    unit_price: f64,
    subtotal: f64,
}

async fn load_details(
    conn: &mut SqliteConnection,
    orders: Vec<Order>,
    scope: DetailScope,
) -> RepoResult<Vec<OrderDetail>> {
    if orders.is_empty() {
        return Ok(vec![]);
    }

    let sql = format!(
        "SELECT oi.id, oi.order_id, oi.meal_id, m.name AS meal_name, m.clave AS meal_clave, m.is_clave_applied, oi.quantity, oi.unit_price, oi.subtotal FROM order_items oi JOIN meals m ON m.id = oi.meal_id {} ORDER BY oi.id",
        scope.filter("oi.order_id")
    );
    let mut query = sqlx::query_as::<_, ItemRow>(&sql);
    if let Some(id) = scope.bind_id() {
        query = query.bind(id);
    }
    let item_rows = query.fetch_all(&mut *conn).await?;

    let sql = format!(
        "SELECT d.order_item_id, d.modifier_id, md.name, md.has_price, md.price, md.clave FROM order_item_details d JOIN modifiers md ON md.id = d.modifier_id JOIN order_items oi ON oi.id = d.order_item_id {} ORDER BY d.id",
        scope.filter("oi.order_id")
    );
    let mut query = sqlx::query_as::<_, SelectedModifier>(&sql);
    if let Some(id) = scope.bind_id() {
        query = query.bind(id);
    }
    let mut modifiers_by_item: HashMap<i64, Vec<SelectedModifier>> = HashMap::new();
    for modifier in query.fetch_all(&mut *conn).await? {
        modifiers_by_item
            .entry(modifier.order_item_id)
            .or_default()
            .push(modifier);
    }

    let sql = format!(
        "SELECT id, order_id, payment_method, amount_given, created_at FROM payments {} ORDER BY id",
        scope.filter("order_id")
    );
    let mut query = sqlx::query_as::<_, Payment>(&sql);
    if let Some(id) = scope.bind_id() {
        query = query.bind(id);
    }
    let mut payments_by_order: HashMap<i64, Vec<Payment>> = HashMap::new();
    for payment in query.fetch_all(&mut *conn).await? {
        payments_by_order
            .entry(payment.order_id)
            .or_default()
            .push(payment);
    }

    let mut items_by_order: HashMap<i64, Vec<OrderItemView>> = HashMap::new();
    for row in item_rows {
        let modifiers = modifiers_by_item.remove(&row.id).unwrap_or_default();
        let clave_line = build_clave_line(
            row.meal_clave.as_deref().filter(|_| row.is_clave_applied),
            &modifiers,
        );
        items_by_order
            .entry(row.order_id)
            .or_default()
            .push(OrderItemView {
                id: row.id,
                meal_id: row.meal_id,
                meal_name: row.meal_name,
                quantity: row.quantity,
                unit_price: row.unit_price,
                subtotal: row.subtotal,
                modifiers,
                clave_line,
            });
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderDetail {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            payments: payments_by_order.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// Kitchen ticket text: meal clave followed by the modifiers' claves
fn build_clave_line(meal_clave: Option<&str>, modifiers: &[SelectedModifier]) -> Option<String> {
    let parts: Vec<&str> = meal_clave
        .into_iter()
        .chain(modifiers.iter().filter_map(|m| m.clave.as_deref()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

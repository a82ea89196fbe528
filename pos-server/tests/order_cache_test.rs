//! 读缓存: 写后失效、后端故障降级

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use pos_server::ErrorCode;
use pos_server::cache::{Cache, CacheError, CacheResult, keys};
use shared::models::{OrderStatus, OrderUpdate};

/// Every call fails, like a Redis that went away
#[derive(Debug)]
struct UnreachableCache;

#[async_trait]
impl Cache for UnreachableCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn test_listing_is_cached_then_invalidated_by_new_order() {
    let env = setup().await;
    let c = env.catalog;

    env.state.orders.place_order(simple_order(&c), None).await.unwrap();
    assert_eq!(env.state.orders.get_orders().await.unwrap().len(), 1);
    assert!(env.cache.get(keys::ALL_ORDERS).await.unwrap().is_some());

    env.state.orders.place_order(simple_order(&c), None).await.unwrap();
    assert!(env.cache.get(keys::ALL_ORDERS).await.unwrap().is_none());

    let orders = env.state.orders.get_orders().await.unwrap();
    assert_eq!(orders.len(), 2);
    // newest first
    assert_eq!(orders[0].order.order_number, 2);
}

#[tokio::test]
async fn test_deleted_order_disappears_from_cached_reads() {
    let env = setup().await;
    let c = env.catalog;

    let placed = env.state.orders.place_order(simple_order(&c), None).await.unwrap();
    env.state.orders.get_orders().await.unwrap();
    env.state.orders.get_order(placed.order_id).await.unwrap();
    assert!(env.cache.get(&keys::order(placed.order_id)).await.unwrap().is_some());

    env.state.orders.delete_order(placed.order_id, None).await.unwrap();

    assert!(env.state.orders.get_orders().await.unwrap().is_empty());
    let err = env.state.orders.get_order(placed.order_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
    assert_eq!(count_rows(&env, "order_items").await, 0);
    assert_eq!(count_rows(&env, "payments").await, 0);
}

#[tokio::test]
async fn test_update_refreshes_single_order_view() {
    let env = setup().await;
    let c = env.catalog;

    let placed = env.state.orders.place_order(simple_order(&c), None).await.unwrap();
    let before = env.state.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(before.order.client_name, "Ana");

    let update = OrderUpdate {
        client_name: Some("Luis".into()),
        ..Default::default()
    };
    env.state
        .orders
        .update_order(placed.order_id, update, None)
        .await
        .unwrap();

    let after = env.state.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(after.order.client_name, "Luis");

    env.state
        .orders
        .update_status(placed.order_id, OrderStatus::Cancelled, None)
        .await
        .unwrap();
    let listing = env.state.orders.get_orders().await.unwrap();
    assert_eq!(listing[0].order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_unreachable_cache_does_not_block_writes_or_reads() {
    let env = setup_with(|_| {}, Arc::new(UnreachableCache)).await;
    let c = env.catalog;

    let placed = env
        .state
        .orders
        .place_order(simple_order(&c), Some(CASHIER_EMAIL))
        .await
        .unwrap();
    assert_eq!(placed.order_number, 1);

    let detail = env.state.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(detail.order.total_price, 50.0);
    assert_eq!(env.state.orders.get_orders().await.unwrap().len(), 1);

    env.state.orders.delete_order(placed.order_id, None).await.unwrap();
    assert!(env.state.orders.get_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_undecodable_entry_falls_back_to_store() {
    let env = setup().await;
    let c = env.catalog;

    env.state.orders.place_order(simple_order(&c), None).await.unwrap();
    env.cache
        .set(keys::ALL_ORDERS, b"not json".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();

    let orders = env.state.orders.get_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn test_listing_survives_a_large_order_history() {
    // More rows than SQLite allows bound variables in one statement
    const HISTORY: i64 = 33_000;
    let env = setup().await;
    let c = env.catalog;

    let placed = env
        .state
        .orders
        .place_order(
            order_request(
                vec![line(c.meal_id, 2, vec![c.priced_modifier_id])],
                vec![cash(130.0)],
            ),
            None,
        )
        .await
        .unwrap();

    sqlx::query(
        "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < ?1) \
         INSERT INTO orders (order_number, status, client_name, client_phone, total_price, user_id, created_at, delivered_at, updated_at) \
         SELECT n, 'delivered', 'Historial', '', 50.0, NULL, ?2 - n * 60000, ?2 - n * 60000, ?2 - n * 60000 FROM seq",
    )
    .bind(HISTORY)
    .bind(at("2024-01-01 12:00"))
    .execute(env.state.pool())
    .await
    .unwrap();
    assert_eq!(count_rows(&env, "orders").await, HISTORY + 1);

    let orders = env.state.orders.get_orders().await.unwrap();
    assert_eq!(orders.len() as i64, HISTORY + 1);

    let newest = &orders[0];
    assert_eq!(newest.order.id, placed.order_id);
    assert_eq!(newest.items.len(), 1);
    assert_eq!(newest.items[0].modifiers.len(), 1);
    assert_eq!(newest.payments.len(), 1);
    assert!(orders[1..].iter().all(|o| o.items.is_empty() && o.payments.is_empty()));

    let detail = env.state.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(detail.order.total_price, 120.0);
    assert_eq!(env.state.orders.next_order_number().await.unwrap(), 2);
}

/// Reads and writes work, deletes do not: entries outlive invalidation
#[derive(Debug, Default)]
struct StickyCache {
    inner: pos_server::cache::MemoryCache,
}

#[async_trait]
impl Cache for StickyCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Backend("DEL timed out".into()))
    }
}

#[tokio::test]
async fn test_update_returns_committed_view_when_invalidation_fails() {
    let env = setup_with(|_| {}, Arc::new(StickyCache::default())).await;
    let c = env.catalog;

    let placed = env.state.orders.place_order(simple_order(&c), None).await.unwrap();
    let cached = env.state.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(cached.order.client_name, "Ana");

    let update = OrderUpdate {
        client_name: Some("Luis".into()),
        items: Some(vec![line(c.meal_id, 1, vec![]), line(c.drink_id, 1, vec![])]),
        payments: Some(vec![cash(62.5)]),
        ..Default::default()
    };
    let updated = env
        .state
        .orders
        .update_order(placed.order_id, update, None)
        .await
        .unwrap();

    assert_eq!(updated.order.client_name, "Luis");
    assert_eq!(updated.order.total_price, 62.5);
    assert_eq!(updated.items.len(), 2);
    assert_eq!(updated.payments.len(), 1);
}

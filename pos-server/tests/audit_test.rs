//! 审计日志: 异步写入、按用户查询

mod common;

use common::*;
use pos_server::core::ActingUserPolicy;
use shared::models::{ActionType, OrderStatus};

#[tokio::test]
async fn test_order_lifecycle_is_audited() {
    let env = setup().await;
    let c = env.catalog;

    let placed = env
        .state
        .orders
        .place_order(simple_order(&c), Some(CASHIER_EMAIL))
        .await
        .unwrap();
    env.state
        .orders
        .update_status(placed.order_id, OrderStatus::Delivered, Some(CASHIER_EMAIL))
        .await
        .unwrap();
    env.state
        .orders
        .delete_order(placed.order_id, Some(CASHIER_EMAIL))
        .await
        .unwrap();

    assert_eq!(wait_for_logs(&env, 3).await, 3);

    let logs = env.state.audit.list_logs_by_user(c.cashier_id).await.unwrap();
    assert_eq!(logs.len(), 3);
    let mut actions: Vec<ActionType> = logs.iter().map(|l| l.action_type).collect();
    actions.sort_by_key(|a| a.to_string());
    assert_eq!(
        actions,
        vec![ActionType::Create, ActionType::Delete, ActionType::Update]
    );
    assert!(logs.iter().all(|l| l.user_email == CASHIER_EMAIL));
    assert!(
        logs.iter()
            .any(|l| l.message.contains(&format!("#{}", placed.order_number)))
    );
}

#[tokio::test]
async fn test_unknown_user_is_not_audited_under_lenient_policy() {
    let env = setup().await;
    let c = env.catalog;

    let placed = env
        .state
        .orders
        .place_order(simple_order(&c), Some("nadie@example.com"))
        .await
        .unwrap();
    let detail = env.state.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(detail.order.user_id, None);

    // a known user's entry proves the worker has drained the queue
    env.state
        .orders
        .place_order(simple_order(&c), Some(CASHIER_EMAIL))
        .await
        .unwrap();
    assert_eq!(wait_for_logs(&env, 1).await, 1);
    assert_eq!(env.state.audit.list_logs().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_strict_policy_rejects_unknown_user_before_writing() {
    let env = setup_with_config(|c| c.acting_user_policy = ActingUserPolicy::Strict).await;
    let c = env.catalog;

    let err = env
        .state
        .orders
        .place_order(simple_order(&c), Some("nadie@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.code.name(), "USER_NOT_FOUND");
    assert_eq!(count_rows(&env, "orders").await, 0);
    assert_eq!(count_rows(&env, "logs").await, 0);
}

#[tokio::test]
async fn test_email_lookup_ignores_case() {
    let env = setup().await;
    let c = env.catalog;

    let placed = env
        .state
        .orders
        .place_order(simple_order(&c), Some("CAJERO@Example.com"))
        .await
        .unwrap();
    let detail = env.state.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(detail.order.user_id, Some(c.cashier_id));
}

#[tokio::test]
async fn test_audit_timestamps_follow_the_engine_clock() {
    let env = setup().await;
    let c = env.catalog;

    let placed = env
        .state
        .orders
        .place_order(simple_order(&c), Some(CASHIER_EMAIL))
        .await
        .unwrap();
    env.clock.set(at("2024-05-10 12:45"));
    env.state
        .orders
        .update_status(placed.order_id, OrderStatus::Delivered, Some(CASHIER_EMAIL))
        .await
        .unwrap();
    assert_eq!(wait_for_logs(&env, 2).await, 2);

    let order = env.state.orders.get_order(placed.order_id).await.unwrap();
    let logs = env.state.audit.list_logs().await.unwrap();
    let created = logs
        .iter()
        .find(|l| l.action_type == ActionType::Create)
        .unwrap();
    let updated = logs
        .iter()
        .find(|l| l.action_type == ActionType::Update)
        .unwrap();

    assert_eq!(created.created_at, order.order.created_at);
    assert_eq!(created.created_at, at("2024-05-10 12:00"));
    assert_eq!(updated.created_at, at("2024-05-10 12:45"));
    assert_eq!(order.order.delivered_at, Some(updated.created_at));
}

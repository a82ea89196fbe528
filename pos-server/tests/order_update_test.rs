//! 订单修改: 重算总价、状态流转、删除

mod common;

use common::*;
use pos_server::ErrorCode;
use pos_server::core::PaymentPolicy;
use shared::models::{OrderStatus, OrderUpdate, PaymentInput, PaymentMethod};

#[tokio::test]
async fn test_replacing_items_rederives_total() {
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

    let update = OrderUpdate {
        items: Some(vec![
            line(c.meal_id, 1, vec![c.free_modifier_id]),
            line(c.drink_id, 2, vec![]),
        ]),
        ..Default::default()
    };
    let detail = env
        .state
        .orders
        .update_order(placed.order_id, update, None)
        .await
        .unwrap();

    assert_eq!(detail.order.total_price, 75.0);
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.order.order_number, placed.order_number);
    assert_eq!(count_rows(&env, "order_item_details").await, 1);
    // tenders untouched
    assert_eq!(detail.payments.len(), 1);
}

#[tokio::test]
async fn test_update_rejects_payments_below_new_total() {
    let env = setup().await;
    let c = env.catalog;
    let placed = env.state.orders.place_order(simple_order(&c), None).await.unwrap();

    let update = OrderUpdate {
        items: Some(vec![line(c.meal_id, 3, vec![])]),
        ..Default::default()
    };
    let err = env
        .state
        .orders
        .update_order(placed.order_id, update, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentInsufficientAmount);

    let detail = env.state.orders.get_order(placed.order_id).await.unwrap();
    assert_eq!(detail.order.total_price, 50.0);
    assert_eq!(detail.items[0].quantity, 1);
}

#[tokio::test]
async fn test_replacing_payments_with_split_tender() {
    let env = setup().await;
    let c = env.catalog;
    let placed = env.state.orders.place_order(simple_order(&c), None).await.unwrap();

    let update = OrderUpdate {
        payments: Some(vec![
            cash(20.0),
            PaymentInput {
                payment_method: PaymentMethod::Card,
                amount_given: 30.0,
            },
        ]),
        ..Default::default()
    };
    let detail = env
        .state
        .orders
        .update_order(placed.order_id, update, None)
        .await
        .unwrap();

    assert_eq!(detail.payments.len(), 2);
    let tendered: f64 = detail.payments.iter().map(|p| p.amount_given).sum();
    assert_eq!(tendered, 50.0);
}

#[tokio::test]
async fn test_advisory_policy_allows_underpaid_update() {
    let env = setup_with_config(|c| c.payment_policy = PaymentPolicy::Advisory).await;
    let c = env.catalog;
    let placed = env.state.orders.place_order(simple_order(&c), None).await.unwrap();

    let update = OrderUpdate {
        items: Some(vec![line(c.meal_id, 2, vec![])]),
        ..Default::default()
    };
    let detail = env
        .state
        .orders
        .update_order(placed.order_id, update, None)
        .await
        .unwrap();
    assert_eq!(detail.order.total_price, 100.0);
}

#[tokio::test]
async fn test_status_transitions_stamp_delivered_at() {
    let env = setup().await;
    let c = env.catalog;
    let placed = env.state.orders.place_order(simple_order(&c), None).await.unwrap();

    env.clock.set(at("2024-05-10 12:30"));
    let delivered = env
        .state
        .orders
        .update_status(placed.order_id, OrderStatus::Delivered, None)
        .await
        .unwrap();
    assert_eq!(delivered.order.status, OrderStatus::Delivered);
    assert_eq!(delivered.order.delivered_at, Some(at("2024-05-10 12:30")));
    assert_eq!(delivered.order.updated_at, at("2024-05-10 12:30"));

    let reopened = env
        .state
        .orders
        .update_status(placed.order_id, OrderStatus::Pending, None)
        .await
        .unwrap();
    assert_eq!(reopened.order.status, OrderStatus::Pending);
    assert_eq!(reopened.order.delivered_at, None);
}

#[tokio::test]
async fn test_update_validation() {
    let env = setup().await;
    let c = env.catalog;
    let placed = env.state.orders.place_order(simple_order(&c), None).await.unwrap();

    let blank_name = OrderUpdate {
        client_name: Some("   ".into()),
        ..Default::default()
    };
    let err = env
        .state
        .orders
        .update_order(placed.order_id, blank_name, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let unknown_meal = OrderUpdate {
        items: Some(vec![line(9999, 1, vec![])]),
        ..Default::default()
    };
    let err = env
        .state
        .orders
        .update_order(placed.order_id, unknown_meal, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MealNotFound);
}

#[tokio::test]
async fn test_missing_order_is_reported() {
    let env = setup().await;

    let err = env
        .state
        .orders
        .update_status(404, OrderStatus::Delivered, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);

    let err = env.state.orders.delete_order(404, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
}

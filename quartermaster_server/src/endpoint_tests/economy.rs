use chrono::Duration;
use quartermaster_engine::db_types::{Order, OrderStatus, TaxiOrder};
use serde_json::json;

use super::helpers::{get, post, post_with_cooldown, seed_medkit, seed_player, seed_taxi, setup};
use crate::data_objects::BalanceResponse;

#[actix_web::test]
async fn purchase_debits_and_creates_a_pending_order() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 500).await;
    seed_medkit(&db, 150).await;

    let payload = json!({"external_id": "discord:alice", "item_name": "MedKit", "quantity": 2});
    let (status, body) = post(&db, "/api/purchase", &payload).await;
    assert!(status.is_success(), "was: {body}");
    let order: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price.value(), 300);

    let (_, body) = get(&db, "/api/balance/discord:alice").await;
    let balance: BalanceResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(balance.balance.value(), 200);
}

#[actix_web::test]
async fn purchase_failures_map_onto_http_codes() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 100).await;
    seed_medkit(&db, 150).await;

    let (status, body) =
        post(&db, "/api/purchase", &json!({"external_id": "discord:alice", "item_name": "MedKit"})).await;
    assert_eq!(status.as_u16(), 400);
    assert!(body.contains("Insufficient funds: 150 coins required, 100 coins available"), "was: {body}");

    let (status, _) = post(&db, "/api/purchase", &json!({"external_id": "discord:alice", "item_name": "Rocket"})).await;
    assert_eq!(status.as_u16(), 404);

    let (status, _) = post(&db, "/api/purchase", &json!({"external_id": "discord:ghost", "item_name": "MedKit"})).await;
    assert_eq!(status.as_u16(), 404);

    let (status, body) =
        post(&db, "/api/purchase", &json!({"external_id": "discord:alice", "item_name": "MedKit", "quantity": 0}))
            .await;
    assert_eq!(status.as_u16(), 400);
    assert!(body.contains("Quantity must be at least 1"), "was: {body}");
}

#[actix_web::test]
async fn a_live_cooldown_answers_429() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 1000).await;
    seed_medkit(&db, 100).await;

    let payload = json!({"external_id": "discord:alice", "item_name": "MedKit"});
    let (status, _) = post_with_cooldown(&db, "/api/purchase", &payload, Duration::seconds(60)).await;
    assert!(status.is_success());
    let (status, body) = post_with_cooldown(&db, "/api/purchase", &payload, Duration::seconds(60)).await;
    assert_eq!(status.as_u16(), 429);
    assert!(body.contains("Too many requests"), "was: {body}");
}

#[actix_web::test]
async fn taxi_orders_validate_the_destination() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 1000).await;
    let taxi_id = seed_taxi(&db, 25).await;

    let payload = json!({
        "external_id": "discord:alice",
        "taxi_id": taxi_id,
        "coordinate": {"x": 100.0, "y": 200.0, "z": 30.0}
    });
    let (status, body) = post(&db, "/api/taxi_orders", &payload).await;
    assert!(status.is_success(), "was: {body}");
    let order: TaxiOrder = serde_json::from_str(&body).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.chosen_coordinate.is_some());

    let payload = json!({
        "external_id": "discord:alice",
        "taxi_id": taxi_id,
        "coordinate": {"x": 1.0, "y": 2.0, "z": 3.0}
    });
    let (status, body) = post(&db, "/api/taxi_orders", &payload).await;
    assert_eq!(status.as_u16(), 400);
    assert!(body.contains("not one of the taxi's destinations"), "was: {body}");
}

#[actix_web::test]
async fn transfers_move_coins_and_reject_bad_requests() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 500).await;
    seed_player(&db, "discord:bob", "Bob", 100).await;

    let (status, body) =
        post(&db, "/api/transfer", &json!({"from": "discord:alice", "to": "discord:bob", "amount": 200})).await;
    assert!(status.is_success(), "was: {body}");
    let outcome: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["sender_balance"], 300);
    assert_eq!(outcome["recipient_balance"], 300);

    let (status, body) =
        post(&db, "/api/transfer", &json!({"from": "discord:alice", "to": "discord:alice", "amount": 10})).await;
    assert_eq!(status.as_u16(), 400);
    assert!(body.contains("yourself"), "was: {body}");

    let (status, _) =
        post(&db, "/api/transfer", &json!({"from": "discord:alice", "to": "discord:bob", "amount": -5})).await;
    assert_eq!(status.as_u16(), 400);
}

use quartermaster_engine::db_types::{Order, OrderStatus, ShopItem, Taxi};
use serde_json::json;

use super::helpers::{delete, get, post, put, seed_medkit, seed_player, seed_taxi, setup};
use crate::data_objects::ImportResponse;

fn medkit_payload(price: i64) -> serde_json::Value {
    json!({
        "name": "MedKit",
        "category": "Medical",
        "price": price,
        "content": [
            {"type": "teleport_to_player"},
            {"type": "spawn_item", "item": "BP_MedKit", "quantity": 1}
        ]
    })
}

#[actix_web::test]
async fn item_crud_round_trips() {
    let db = setup().await;

    let (status, body) = post(&db, "/api/items", &medkit_payload(150)).await;
    assert!(status.is_success(), "was: {body}");
    let item: ShopItem = serde_json::from_str(&body).unwrap();
    assert_eq!(item.name, "MedKit");
    // The relay is unconfigured, so no error is surfaced on the write.
    assert!(!body.contains("relay_error"), "was: {body}");

    let (status, body) = post(&db, "/api/items", &medkit_payload(99)).await;
    assert_eq!(status.as_u16(), 409);
    assert!(body.contains("already exists"), "was: {body}");

    let (status, body) = put(&db, &format!("/api/items/{}", item.id), &medkit_payload(80)).await;
    assert!(status.is_success(), "was: {body}");
    let updated: ShopItem = serde_json::from_str(&body).unwrap();
    assert_eq!(updated.price.value(), 80);

    let (status, _) = delete(&db, &format!("/api/items/{}", item.id)).await;
    assert!(status.is_success());
    let (status, _) = get(&db, &format!("/api/items/{}", item.id)).await;
    assert_eq!(status.as_u16(), 404);
}

#[actix_web::test]
async fn invalid_content_is_rejected_with_400() {
    let db = setup().await;
    let payload = json!({
        "name": "Dud",
        "price": 10,
        "content": [{"type": "spawn_item", "item": "", "quantity": 1}]
    });
    let (status, body) = post(&db, "/api/items", &payload).await;
    assert_eq!(status.as_u16(), 400);
    assert!(body.contains("empty item name"), "was: {body}");
}

#[actix_web::test]
async fn taxi_crud_round_trips() {
    let db = setup().await;
    let payload = json!({
        "name": "Downtown",
        "price": 25,
        "coordinates": [{"x": 100.0, "y": 200.0, "z": 30.0}]
    });
    let (status, body) = post(&db, "/api/taxis", &payload).await;
    assert!(status.is_success(), "was: {body}");
    let taxi: Taxi = serde_json::from_str(&body).unwrap();

    let (_, body) = get(&db, "/api/taxis").await;
    let taxis: Vec<Taxi> = serde_json::from_str(&body).unwrap();
    assert_eq!(taxis.len(), 1);

    let (status, _) = delete(&db, &format!("/api/taxis/{}", taxi.id)).await;
    assert!(status.is_success());
    let (status, _) = get(&db, &format!("/api/taxis/{}", taxi.id)).await;
    assert_eq!(status.as_u16(), 404);
}

#[actix_web::test]
async fn export_import_round_trips() {
    let db = setup().await;
    seed_medkit(&db, 150).await;
    seed_taxi(&db, 25).await;

    let (status, snapshot) = get(&db, "/api/items/export").await;
    assert!(status.is_success());
    let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(parsed["items"].as_array().unwrap().len(), 1);
    assert_eq!(parsed["taxis"].as_array().unwrap().len(), 1);

    // Importing the snapshot we just exported is a no-op by name.
    let (status, body) = post(&db, "/api/items/import", &parsed).await;
    assert!(status.is_success(), "was: {body}");
    let result: ImportResponse = serde_json::from_str(&body).unwrap();
    assert_eq!((result.items, result.taxis), (1, 1));
    let (_, body) = get(&db, "/api/items").await;
    let items: Vec<ShopItem> = serde_json::from_str(&body).unwrap();
    assert_eq!(items.len(), 1);
}

#[actix_web::test]
async fn status_override_respects_the_state_machine() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 500).await;
    seed_medkit(&db, 100).await;
    let (_, body) = post(&db, "/api/purchase", &json!({"external_id": "discord:alice", "item_name": "MedKit"})).await;
    let order: Order = serde_json::from_str(&body).unwrap();

    let (status, body) = post(&db, &format!("/api/orders/{}/status", order.id), &json!({"status": "Delivered"})).await;
    assert!(status.is_success(), "was: {body}");
    let updated: Order = serde_json::from_str(&body).unwrap();
    assert_eq!(updated.status, OrderStatus::Delivered);

    // Terminal orders refuse further overrides.
    let (status, body) = post(&db, &format!("/api/orders/{}/status", order.id), &json!({"status": "Failed"})).await;
    assert_eq!(status.as_u16(), 409);
    assert!(body.contains("Invalid status change"), "was: {body}");

    let (status, _) = post(&db, "/api/orders/999/status", &json!({"status": "Failed"})).await;
    assert_eq!(status.as_u16(), 404);
}

#[actix_web::test]
async fn order_listing_filters_by_status() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 500).await;
    seed_medkit(&db, 100).await;
    let (_, body) = post(&db, "/api/purchase", &json!({"external_id": "discord:alice", "item_name": "MedKit"})).await;
    let first: Order = serde_json::from_str(&body).unwrap();
    post(&db, "/api/purchase", &json!({"external_id": "discord:alice", "item_name": "MedKit"})).await;
    post(&db, &format!("/api/orders/{}/status", first.id), &json!({"status": "Failed"})).await;

    let (status, body) = get(&db, "/api/orders?status=Pending").await;
    assert!(status.is_success());
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Pending);

    let (_, body) = get(&db, "/api/orders").await;
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 2);
}

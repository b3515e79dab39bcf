use log::*;
use quartermaster_engine::db_types::{AuditEntry, Player};
use serde_json::json;

use super::helpers::{delete, get, patch, post, seed_medkit, seed_player, setup};

#[actix_web::test]
async fn health_check() {
    let db = setup().await;
    let (status, body) = get(&db, "/health").await;
    assert!(status.is_success());
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn register_is_an_upsert() {
    let db = setup().await;
    let payload = json!({"external_id": "discord:alice", "ingame_name": "Alice"});
    let (status, body) = post(&db, "/api/players", &payload).await;
    assert!(status.is_success(), "was: {body}");
    let player: Player = serde_json::from_str(&body).unwrap();
    assert_eq!(player.external_id, "discord:alice");

    // Re-registering refreshes the name instead of failing.
    let payload = json!({"external_id": "discord:alice", "ingame_name": "Alicia"});
    let (status, body) = post(&db, "/api/players", &payload).await;
    assert!(status.is_success());
    let player: Player = serde_json::from_str(&body).unwrap();
    assert_eq!(player.ingame_name, "Alicia");

    let (_, body) = get(&db, "/api/players").await;
    let players: Vec<Player> = serde_json::from_str(&body).unwrap();
    assert_eq!(players.len(), 1);
}

#[actix_web::test]
async fn missing_player_is_a_404() {
    let db = setup().await;
    let (status, body) = get(&db, "/api/players/discord:nobody").await;
    assert_eq!(status.as_u16(), 404);
    assert!(body.contains("No player registered"), "was: {body}");
}

#[actix_web::test]
async fn patch_overrides_name_and_balance_and_is_audited() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 100).await;

    let (status, body) = patch(&db, "/api/players/discord:alice", &json!({"balance": 750})).await;
    assert!(status.is_success(), "was: {body}");
    let player: Player = serde_json::from_str(&body).unwrap();
    info!("Patched player: {player:?}");
    assert_eq!(player.balance.value(), 750);
    // The omitted name is untouched.
    assert_eq!(player.ingame_name, "Alice");

    let (_, body) = get(&db, "/api/audit?limit=5").await;
    let entries: Vec<AuditEntry> = serde_json::from_str(&body).unwrap();
    assert!(entries.iter().any(|e| e.action == "player.update" && e.admin_id == "admin:test"), "was: {entries:?}");
}

#[actix_web::test]
async fn delete_removes_the_player_and_their_orders() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 500).await;
    seed_medkit(&db, 100).await;
    let (status, _) = post(&db, "/api/purchase", &json!({"external_id": "discord:alice", "item_name": "MedKit"})).await;
    assert!(status.is_success());

    let (status, _) = delete(&db, "/api/players/discord:alice").await;
    assert!(status.is_success());
    let (status, _) = get(&db, "/api/players/discord:alice").await;
    assert_eq!(status.as_u16(), 404);
    let (_, body) = get(&db, "/api/orders").await;
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn order_history_is_newest_first() {
    let db = setup().await;
    seed_player(&db, "discord:alice", "Alice", 1000).await;
    seed_medkit(&db, 100).await;
    for _ in 0..3 {
        let (status, _) =
            post(&db, "/api/purchase", &json!({"external_id": "discord:alice", "item_name": "MedKit"})).await;
        assert!(status.is_success());
    }

    let (status, body) = get(&db, "/api/players/discord:alice/orders?limit=2").await;
    assert!(status.is_success());
    let history: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["item_name"], "MedKit");
}

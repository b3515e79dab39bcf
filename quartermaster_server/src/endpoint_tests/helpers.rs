//! Scaffolding for the route tests: a fresh database per test and one-shot request helpers.
//! The relay is left unconfigured, so catalog pushes are silent no-ops here.

use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, App};
use chrono::Duration;
use qm_common::Coins;
use quartermaster_engine::{
    commands::{CommandTemplate, Coordinate},
    db_types::{NewPlayer, NewShopItem, NewTaxi},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CatalogManagement,
    PlayerManagement,
    SqliteDatabase,
};
use serde::Serialize;

use crate::{
    config::{PurchaseCooldown, RelayConfig},
    relay::CatalogRelay,
    server::configure_api,
};

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database")
}

async fn send(db: &SqliteDatabase, cooldown: Option<Duration>, req: TestRequest) -> (StatusCode, String) {
    let relay = CatalogRelay::new(RelayConfig::default()).expect("Error creating relay client");
    let app = App::new().configure(configure_api(db.clone(), relay, PurchaseCooldown(cooldown)));
    let service = test::init_service(app).await;
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub async fn get(db: &SqliteDatabase, path: &str) -> (StatusCode, String) {
    send(db, None, TestRequest::get().uri(path)).await
}

pub async fn post<B: Serialize>(db: &SqliteDatabase, path: &str, body: &B) -> (StatusCode, String) {
    send(db, None, TestRequest::post().uri(path).set_json(body)).await
}

pub async fn post_with_cooldown<B: Serialize>(
    db: &SqliteDatabase,
    path: &str,
    body: &B,
    cooldown: Duration,
) -> (StatusCode, String) {
    send(db, Some(cooldown), TestRequest::post().uri(path).set_json(body)).await
}

pub async fn put<B: Serialize>(db: &SqliteDatabase, path: &str, body: &B) -> (StatusCode, String) {
    send(db, None, TestRequest::put().uri(path).set_json(body)).await
}

pub async fn patch<B: Serialize>(db: &SqliteDatabase, path: &str, body: &B) -> (StatusCode, String) {
    send(db, None, TestRequest::patch().uri(path).set_json(body).insert_header(("x-admin-id", "admin:test"))).await
}

pub async fn delete(db: &SqliteDatabase, path: &str) -> (StatusCode, String) {
    send(db, None, TestRequest::delete().uri(path).insert_header(("x-admin-id", "admin:test"))).await
}

/// Registers a player and gives them a starting balance, bypassing the HTTP surface.
pub async fn seed_player(db: &SqliteDatabase, external_id: &str, name: &str, balance: i64) {
    db.register_player(NewPlayer::new(external_id, name)).await.expect("Error registering player");
    db.update_player(external_id, name, Coins::from(balance)).await.expect("Error funding player");
}

pub async fn seed_medkit(db: &SqliteDatabase, price: i64) -> i64 {
    let item = NewShopItem {
        name: "MedKit".to_string(),
        category: "Medical".to_string(),
        price: Coins::from(price),
        image_url: None,
        description: None,
        content: vec![
            CommandTemplate::TeleportToPlayer,
            CommandTemplate::SpawnItem { item: "BP_MedKit".to_string(), quantity: 1 },
        ],
    };
    db.add_item(item).await.expect("Error adding item").id
}

pub async fn seed_taxi(db: &SqliteDatabase, price: i64) -> i64 {
    let taxi = NewTaxi {
        name: "Downtown".to_string(),
        price: Coins::from(price),
        coordinates: vec![Coordinate::new(100.0, 200.0, 30.0), Coordinate::new(-50.0, 75.0, 12.0)],
    };
    db.add_taxi(taxi).await.expect("Error adding taxi").id
}

//! Shared scaffolding for the engine integration tests: a fresh database per test, plus a small
//! seeded world to run orders through.

use log::*;
use qm_common::Coins;
use quartermaster_engine::{
    commands::{CommandTemplate, Coordinate},
    db_types::{NewPlayer, NewShopItem, NewTaxi},
    sqlite::SqliteDatabase,
    CatalogManagement,
    PlayerManagement,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("quartermaster_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn setup() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(&url).await.expect("Error creating database");
    // A single connection serializes every statement through one sqlx worker thread. With more
    // connections, `INSERT/UPDATE … RETURNING` read via `fetch_one`/`fetch_optional` commits on
    // the worker *after* the call returns, so the next query on another connection can miss it.
    SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database")
}

pub async fn tear_down(db: SqliteDatabase) {
    use quartermaster_engine::LedgerDatabase;
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        error!("🚀️ Failed to drop database {url}: {e}");
    }
}

/// Registers a player with the given starting balance.
pub async fn seed_player(db: &SqliteDatabase, external_id: &str, ingame_name: &str, balance: i64) {
    let player = db.register_player(NewPlayer::new(external_id, ingame_name)).await.expect("Error registering player");
    db.update_player(external_id, ingame_name, Coins::from(balance)).await.expect("Error funding player");
    debug!("🚀️ Seeded player {} with {balance} coins", player.external_id);
}

pub fn medkit(price: i64) -> NewShopItem {
    NewShopItem {
        name: "MedKit".to_string(),
        category: "Medical".to_string(),
        price: Coins::from(price),
        image_url: None,
        description: Some("Patches you up".to_string()),
        content: vec![
            CommandTemplate::TeleportToPlayer,
            CommandTemplate::SpawnItem { item: "BP_MedKit".to_string(), quantity: 1 },
        ],
    }
}

pub fn downtown_taxi(price: i64) -> NewTaxi {
    NewTaxi {
        name: "Downtown".to_string(),
        price: Coins::from(price),
        coordinates: vec![Coordinate::new(100.0, 200.0, 30.0), Coordinate::new(-50.0, 75.0, 12.0)],
    }
}

pub async fn seed_catalog(db: &SqliteDatabase) -> (i64, i64) {
    let item = db.add_item(medkit(50)).await.expect("Error adding item");
    let taxi = db.add_taxi(downtown_taxi(25)).await.expect("Error adding taxi");
    (item.id, taxi.id)
}

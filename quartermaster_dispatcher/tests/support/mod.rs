//! Shared scaffolding for the dispatcher tests: a fresh database, a seeded world, scripted
//! actuators, and a config with timings tightened for tests.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use qm_common::Coins;
use quartermaster_dispatcher::{
    actuator::{Actuator, ActuatorError},
    config::{ActuatorConfig, DispatcherConfig},
};
use quartermaster_engine::{
    commands::{CommandTemplate, ConsoleCommand, Coordinate},
    db_types::{NewPlayer, NewShopItem, NewTaxi},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CatalogManagement,
    LeaseManagement,
    PlayerManagement,
    SqliteDatabase,
};

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    // A single connection serializes every statement through one sqlx worker thread. With more
    // connections, `INSERT/UPDATE … RETURNING` read via `fetch_one`/`fetch_optional` commits on
    // the worker *after* the call returns, so the next query on another connection can miss it.
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
    db.acquire_lease("dispatcher-test", chrono::Duration::seconds(60)).await.expect("Error acquiring lease");
    db
}

pub fn test_config() -> DispatcherConfig {
    DispatcherConfig {
        database_url: String::new(),
        poll_interval: Duration::from_millis(10),
        batch_size: 5,
        instance_id: "dispatcher-test".to_string(),
        lease_ttl: chrono::Duration::seconds(60),
        actuator: ActuatorConfig {
            console_addr: String::new(),
            timeout: Duration::from_millis(100),
            command_delay: Duration::ZERO,
            staging: None,
        },
    }
}

pub async fn seed_player(db: &SqliteDatabase, external_id: &str, name: &str, balance: i64) {
    db.register_player(NewPlayer::new(external_id, name)).await.expect("Error registering player");
    db.update_player(external_id, name, Coins::from(balance)).await.expect("Error funding player");
}

pub async fn seed_medkit(db: &SqliteDatabase, price: i64) {
    let item = NewShopItem {
        name: "MedKit".to_string(),
        category: "Medical".to_string(),
        price: Coins::from(price),
        image_url: None,
        description: None,
        content: vec![CommandTemplate::SpawnItem { item: "BP_MedKit".to_string(), quantity: 2 }],
    };
    db.add_item(item).await.expect("Error adding item");
}

pub async fn seed_taxi(db: &SqliteDatabase, coordinates: Vec<Coordinate>) -> i64 {
    let taxi = NewTaxi { name: "Downtown".to_string(), price: Coins::from(25), coordinates };
    db.add_taxi(taxi).await.expect("Error adding taxi").id
}

//----------------------------------   Scripted actuators   ----------------------------------------

/// Records every line the worker would have typed into the console.
#[derive(Clone, Default)]
pub struct RecordingActuator {
    issued: Arc<Mutex<Vec<String>>>,
}

impl RecordingActuator {
    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }
}

impl Actuator for RecordingActuator {
    async fn connect(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }

    async fn issue(&mut self, command: &ConsoleCommand) -> Result<(), ActuatorError> {
        self.issued.lock().unwrap().push(command.as_str().to_string());
        Ok(())
    }

    async fn return_to_staging(&mut self) -> Result<(), ActuatorError> {
        self.issued.lock().unwrap().push("<staging>".to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }
}

/// Accepts the connection but never acknowledges a command, so every issue step times out.
pub struct HangingActuator;

impl Actuator for HangingActuator {
    async fn connect(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }

    async fn issue(&mut self, _command: &ConsoleCommand) -> Result<(), ActuatorError> {
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn return_to_staging(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }
}

/// Drops the connection on the first command, standing in for a crashed console bridge.
pub struct LostConnectionActuator;

impl Actuator for LostConnectionActuator {
    async fn connect(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }

    async fn issue(&mut self, _command: &ConsoleCommand) -> Result<(), ActuatorError> {
        Err(ActuatorError::ConnectionLost("broken pipe".to_string()))
    }

    async fn return_to_staging(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }
}

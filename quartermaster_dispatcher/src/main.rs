use dotenvy::dotenv;
use log::*;
use quartermaster_dispatcher::{
    actuator::{Actuator, ConsoleActuator},
    config::DispatcherConfig,
    errors::DispatchError,
    worker::DeliveryWorker,
};
use quartermaster_engine::{events::EventProducers, DispatchApi, SqliteDatabase};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = DispatcherConfig::from_env_or_default();

    info!("🚀️ Starting delivery dispatcher {}", config.instance_id);
    match run(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => {
            error!("🚀️ Dispatcher stopped: {e}");
            std::process::exit(1);
        },
    }
}

async fn run(config: DispatcherConfig) -> Result<(), DispatchError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 5)
        .await
        .map_err(|e| DispatchError::InitializeError(e.to_string()))?;

    // A live foreign lease means another instance is already driving the console. Bail out
    // before touching the actuator.
    let api = DispatchApi::new(db.clone(), EventProducers::default());
    api.acquire_lease(&config.instance_id, config.lease_ttl).await?;

    let mut actuator = ConsoleActuator::new(config.actuator.clone());
    if let Err(e) = actuator.connect().await {
        let _ = api.release_lease(&config.instance_id).await;
        return Err(e.into());
    }

    let mut worker = DeliveryWorker::new(db, actuator, config);
    let result = tokio::select! {
        res = worker.run() => res,
        _ = tokio::signal::ctrl_c() => {
            info!("🚀️ Shutdown signal received");
            Ok(())
        },
    };
    worker.shutdown().await;
    result
}

use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use quartermaster_engine::{events::EventProducers, CatalogApi, OrderFlowApi, PlayerApi, SqliteDatabase};

use crate::{
    config::{PurchaseCooldown, ServerConfig},
    errors::ServerError,
    relay::CatalogRelay,
    routes,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let relay = CatalogRelay::new(config.relay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let cooldown = PurchaseCooldown(config.purchase_cooldown);
    debug!("💻️ Starting server instance against {}", config.database_url);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("qms::access_log"))
            .configure(configure_api(db.clone(), relay.clone(), cooldown))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the API state and every route. Shared between the real server and the route tests.
pub fn configure_api(
    db: SqliteDatabase,
    relay: CatalogRelay,
    cooldown: PurchaseCooldown,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let order_flow = OrderFlowApi::new(db.clone(), EventProducers::default());
        let players = PlayerApi::new(db.clone());
        let catalog = CatalogApi::new(db);
        // The literal /items/export and /items/import paths must land before /items/{id}.
        let api_scope = web::scope("/api")
            .service(routes::get_players)
            .service(routes::register_player)
            .service(routes::player_orders)
            .service(routes::get_player)
            .service(routes::update_player)
            .service(routes::delete_player)
            .service(routes::purchase)
            .service(routes::order_taxi)
            .service(routes::transfer)
            .service(routes::get_balance)
            .service(routes::export_catalog)
            .service(routes::import_catalog)
            .service(routes::get_items)
            .service(routes::create_item)
            .service(routes::get_item)
            .service(routes::update_item)
            .service(routes::delete_item)
            .service(routes::get_taxis)
            .service(routes::create_taxi)
            .service(routes::get_taxi)
            .service(routes::update_taxi)
            .service(routes::delete_taxi)
            .service(routes::get_orders)
            .service(routes::set_order_status)
            .service(routes::get_audit);
        cfg.app_data(web::Data::new(order_flow))
            .app_data(web::Data::new(players))
            .app_data(web::Data::new(catalog))
            .app_data(web::Data::new(relay))
            .app_data(web::Data::new(cooldown))
            .service(routes::health)
            .service(api_scope);
    }
}

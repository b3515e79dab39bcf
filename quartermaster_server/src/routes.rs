//! Request handlers for the JSON API.
//!
//! Routes are deliberately thin: deserialize, call the matching engine API, map the error
//! taxonomy onto HTTP codes (see [`crate::errors::ServerError`]), serialize. Administrative
//! mutations additionally land an audit row; the admin identity comes from the `x-admin-id`
//! header the admin UI attaches.

use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse, Responder};
use log::*;
use quartermaster_engine::{
    db_types::{NewPlayer, NewShopItem, NewTaxi},
    traits::OrderQueryFilter,
    CatalogApi,
    CatalogExport,
    OrderFlowApi,
    PlayerApi,
    SqliteDatabase,
};

use crate::{
    config::PurchaseCooldown,
    data_objects::{
        BalanceResponse,
        ImportResponse,
        LimitQuery,
        PurchaseRequest,
        RelayedResponse,
        StatusUpdateRequest,
        TaxiOrderRequest,
        TransferRequest,
        UpdatePlayerRequest,
    },
    errors::ServerError,
    relay::{CatalogRelay, RelayError},
};

type OrderFlow = web::Data<OrderFlowApi<SqliteDatabase>>;
type Players = web::Data<PlayerApi<SqliteDatabase>>;
type Catalog = web::Data<CatalogApi<SqliteDatabase>>;

const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Pulls the admin identity off the request for the audit trail.
fn admin_id(req: &HttpRequest) -> String {
    req.headers()
        .get("x-admin-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn relay_outcome(result: Result<(), RelayError>, name: &str) -> Option<String> {
    match result {
        Ok(()) => None,
        Err(e) => {
            warn!("💻️ Catalog relay push failed for '{name}': {e}");
            Some(e.to_string())
        },
    }
}

//----------------------------------------   Health    ---------------------------------------------

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Health check");
    "👍️\n"
}

//----------------------------------------   Players   ---------------------------------------------

#[get("/players")]
pub async fn get_players(players: Players) -> Result<HttpResponse, ServerError> {
    let result = players.all_players().await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/players")]
pub async fn register_player(body: web::Json<NewPlayer>, players: Players) -> Result<HttpResponse, ServerError> {
    let player = players.register(body.into_inner()).await?;
    debug!("💻️ Player {} registered / refreshed", player.external_id);
    Ok(HttpResponse::Ok().json(player))
}

#[get("/players/{external_id}")]
pub async fn get_player(path: web::Path<String>, players: Players) -> Result<HttpResponse, ServerError> {
    let external_id = path.into_inner();
    let player = players
        .player(&external_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No player registered for '{external_id}'")))?;
    Ok(HttpResponse::Ok().json(player))
}

/// Administrative name/balance override. Omitted fields keep their current value.
#[patch("/players/{external_id}")]
pub async fn update_player(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdatePlayerRequest>,
    players: Players,
    catalog: Catalog,
) -> Result<HttpResponse, ServerError> {
    let external_id = path.into_inner();
    let current = players
        .player(&external_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No player registered for '{external_id}'")))?;
    let body = body.into_inner();
    let ingame_name = body.ingame_name.unwrap_or(current.ingame_name);
    let balance = body.balance.unwrap_or(current.balance);
    let player = players.update(&external_id, &ingame_name, balance).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "player.update", Some(&external_id)).await?;
    info!("💻️ Player {external_id} updated by {admin}. Balance is now {balance}");
    Ok(HttpResponse::Ok().json(player))
}

#[delete("/players/{external_id}")]
pub async fn delete_player(
    req: HttpRequest,
    path: web::Path<String>,
    players: Players,
    catalog: Catalog,
) -> Result<HttpResponse, ServerError> {
    let external_id = path.into_inner();
    players.delete(&external_id).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "player.delete", Some(&external_id)).await?;
    info!("💻️ Player {external_id} deleted by {admin}");
    Ok(HttpResponse::Ok().finish())
}

#[get("/players/{external_id}/orders")]
pub async fn player_orders(
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
    players: Players,
) -> Result<HttpResponse, ServerError> {
    let external_id = path.into_inner();
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let history = players.history(&external_id, limit).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------   Economy   ---------------------------------------------

#[post("/purchase")]
pub async fn purchase(
    body: web::Json<PurchaseRequest>,
    orders: OrderFlow,
    cooldown: web::Data<PurchaseCooldown>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let order = orders.purchase(&req.external_id, &req.item_name, req.quantity, cooldown.0).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[post("/taxi_orders")]
pub async fn order_taxi(
    body: web::Json<TaxiOrderRequest>,
    orders: OrderFlow,
    cooldown: web::Data<PurchaseCooldown>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let order = orders.order_taxi(&req.external_id, req.taxi_id, req.coordinate, cooldown.0).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[post("/transfer")]
pub async fn transfer(body: web::Json<TransferRequest>, orders: OrderFlow) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let outcome = orders.transfer(&req.from, &req.to, req.amount).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[get("/balance/{external_id}")]
pub async fn get_balance(path: web::Path<String>, players: Players) -> Result<HttpResponse, ServerError> {
    let external_id = path.into_inner();
    let balance = players.balance(&external_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse { external_id, balance }))
}

//----------------------------------------   Catalog   ---------------------------------------------

#[get("/items")]
pub async fn get_items(catalog: Catalog) -> Result<HttpResponse, ServerError> {
    let items = catalog.all_items().await?;
    Ok(HttpResponse::Ok().json(items))
}

#[post("/items")]
pub async fn create_item(
    req: HttpRequest,
    body: web::Json<NewShopItem>,
    catalog: Catalog,
    relay: web::Data<CatalogRelay>,
) -> Result<HttpResponse, ServerError> {
    let item = catalog.add_item(body.into_inner()).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "item.create", Some(&item.name)).await?;
    info!("💻️ Item '{}' created by {admin}", item.name);
    let relay_error = relay_outcome(relay.publish_item(&item).await, &item.name);
    Ok(HttpResponse::Ok().json(RelayedResponse { record: item, relay_error }))
}

#[get("/items/{id}")]
pub async fn get_item(path: web::Path<i64>, catalog: Catalog) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    let item = catalog
        .item(item_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No shop item with id {item_id}")))?;
    Ok(HttpResponse::Ok().json(item))
}

#[put("/items/{id}")]
pub async fn update_item(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<NewShopItem>,
    catalog: Catalog,
    relay: web::Data<CatalogRelay>,
) -> Result<HttpResponse, ServerError> {
    let item = catalog.update_item(path.into_inner(), body.into_inner()).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "item.update", Some(&item.name)).await?;
    info!("💻️ Item '{}' updated by {admin}", item.name);
    let relay_error = relay_outcome(relay.publish_item(&item).await, &item.name);
    Ok(HttpResponse::Ok().json(RelayedResponse { record: item, relay_error }))
}

#[delete("/items/{id}")]
pub async fn delete_item(
    req: HttpRequest,
    path: web::Path<i64>,
    catalog: Catalog,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    catalog.delete_item(item_id).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "item.delete", Some(&item_id.to_string())).await?;
    info!("💻️ Item #{item_id} deleted by {admin}");
    Ok(HttpResponse::Ok().finish())
}

#[get("/items/export")]
pub async fn export_catalog(catalog: Catalog) -> Result<HttpResponse, ServerError> {
    let snapshot = catalog.export().await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

#[post("/items/import")]
pub async fn import_catalog(
    req: HttpRequest,
    body: web::Json<CatalogExport>,
    catalog: Catalog,
) -> Result<HttpResponse, ServerError> {
    let (items, taxis) = catalog.import(body.into_inner()).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "catalog.import", Some(&format!("{items} items, {taxis} taxis"))).await?;
    Ok(HttpResponse::Ok().json(ImportResponse { items, taxis }))
}

#[get("/taxis")]
pub async fn get_taxis(catalog: Catalog) -> Result<HttpResponse, ServerError> {
    let taxis = catalog.all_taxis().await?;
    Ok(HttpResponse::Ok().json(taxis))
}

#[post("/taxis")]
pub async fn create_taxi(
    req: HttpRequest,
    body: web::Json<NewTaxi>,
    catalog: Catalog,
    relay: web::Data<CatalogRelay>,
) -> Result<HttpResponse, ServerError> {
    let taxi = catalog.add_taxi(body.into_inner()).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "taxi.create", Some(&taxi.name)).await?;
    info!("💻️ Taxi '{}' created by {admin}", taxi.name);
    let relay_error = relay_outcome(relay.publish_taxi(&taxi).await, &taxi.name);
    Ok(HttpResponse::Ok().json(RelayedResponse { record: taxi, relay_error }))
}

#[get("/taxis/{id}")]
pub async fn get_taxi(path: web::Path<i64>, catalog: Catalog) -> Result<HttpResponse, ServerError> {
    let taxi_id = path.into_inner();
    let taxi =
        catalog.taxi(taxi_id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("No taxi with id {taxi_id}")))?;
    Ok(HttpResponse::Ok().json(taxi))
}

#[put("/taxis/{id}")]
pub async fn update_taxi(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<NewTaxi>,
    catalog: Catalog,
    relay: web::Data<CatalogRelay>,
) -> Result<HttpResponse, ServerError> {
    let taxi = catalog.update_taxi(path.into_inner(), body.into_inner()).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "taxi.update", Some(&taxi.name)).await?;
    info!("💻️ Taxi '{}' updated by {admin}", taxi.name);
    let relay_error = relay_outcome(relay.publish_taxi(&taxi).await, &taxi.name);
    Ok(HttpResponse::Ok().json(RelayedResponse { record: taxi, relay_error }))
}

#[delete("/taxis/{id}")]
pub async fn delete_taxi(
    req: HttpRequest,
    path: web::Path<i64>,
    catalog: Catalog,
) -> Result<HttpResponse, ServerError> {
    let taxi_id = path.into_inner();
    catalog.delete_taxi(taxi_id).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "taxi.delete", Some(&taxi_id.to_string())).await?;
    info!("💻️ Taxi #{taxi_id} deleted by {admin}");
    Ok(HttpResponse::Ok().finish())
}

//----------------------------------------    Orders   ---------------------------------------------

#[get("/orders")]
pub async fn get_orders(query: web::Query<OrderQueryFilter>, orders: OrderFlow) -> Result<HttpResponse, ServerError> {
    let result = orders.search_orders(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Admin override of an order's status. The Pending→terminal state machine still applies, so a
/// terminal order answers 409.
#[post("/orders/{id}/status")]
pub async fn set_order_status(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    orders: OrderFlow,
    catalog: Catalog,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    let order = orders.set_order_status(order_id, status).await?;
    let admin = admin_id(&req);
    catalog.record_audit(&admin, "order.status_override", Some(&format!("#{order_id} to {status}"))).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------    Audit    ---------------------------------------------

#[get("/audit")]
pub async fn get_audit(query: web::Query<LimitQuery>, catalog: Catalog) -> Result<HttpResponse, ServerError> {
    let limit = query.limit.unwrap_or(50);
    let entries = catalog.recent_audit(limit).await?;
    Ok(HttpResponse::Ok().json(entries))
}

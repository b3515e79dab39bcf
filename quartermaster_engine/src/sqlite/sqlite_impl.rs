//! `SqliteDatabase` is a concrete implementation of a Quartermaster backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use qm_common::Coins;
use sqlx::SqlitePool;

use super::db::{audit, db_url, lease, new_pool, orders, players, rate_limits, run_migrations, shop_items, taxi_orders, taxis};
use crate::{
    commands::{CommandTemplate, Coordinate},
    db_types::{
        AuditEntry,
        NewOrder,
        NewPlayer,
        NewShopItem,
        NewTaxi,
        NewTaxiOrder,
        Order,
        OrderStatus,
        Player,
        ShopItem,
        Taxi,
        TaxiOrder,
    },
    traits::{
        AuditManagement,
        CatalogApiError,
        CatalogManagement,
        LeaseManagement,
        LedgerDatabase,
        LedgerError,
        OrderHistoryEntry,
        OrderQueryFilter,
        PendingDelivery,
        PendingTaxiDelivery,
        PlayerApiError,
        PlayerManagement,
        TransferOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Authorizes a purchase in a single atomic transaction:
    /// * the player's balance is debited, but only if it covers `price × quantity`,
    /// * a `Pending` order is inserted.
    /// If any step fails, the transaction rolls back and no money moves.
    async fn authorize_purchase(
        &self,
        external_id: &str,
        item_name: &str,
        quantity: i64,
    ) -> Result<Order, LedgerError> {
        if quantity < 1 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        let mut tx = self.pool.begin().await?;
        let player = players::fetch_player_by_external_id(external_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::PlayerNotFound(external_id.to_string()))?;
        let (item_id, price) = shop_items::fetch_item_for_purchase(item_name, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::ItemNotFound(item_name.to_string()))?;
        // The quantity is caller-supplied; the total must not wrap.
        let total = price.checked_mul(quantity).ok_or(LedgerError::InvalidQuantity(quantity))?;
        let debited = players::debit_if_sufficient(player.id, total, &mut tx)
            .await?
            .ok_or(LedgerError::InsufficientFunds { required: total, available: player.balance })?;
        let order =
            orders::insert_order(NewOrder { player_id: player.id, item_id, quantity, total_price: total }, &mut tx)
                .await?;
        tx.commit().await?;
        debug!(
            "🔄️ Order #{} authorized: {quantity} × '{item_name}' for {total}. Balance of {external_id} is now {}",
            order.id, debited.balance
        );
        Ok(order)
    }

    async fn authorize_taxi_order(
        &self,
        external_id: &str,
        taxi_id: i64,
        chosen: Option<Coordinate>,
    ) -> Result<TaxiOrder, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let player = players::fetch_player_by_external_id(external_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::PlayerNotFound(external_id.to_string()))?;
        let taxi = taxis::fetch_taxi(taxi_id, &mut tx).await?.ok_or(LedgerError::TaxiNotFound(taxi_id))?;
        if let Some(coord) = chosen {
            if !taxi.coordinates.contains(&coord) {
                return Err(LedgerError::InvalidCoordinate(coord.to_string()));
            }
        }
        let debited = players::debit_if_sufficient(player.id, taxi.price, &mut tx)
            .await?
            .ok_or(LedgerError::InsufficientFunds { required: taxi.price, available: player.balance })?;
        let order = taxi_orders::insert_taxi_order(
            NewTaxiOrder { player_id: player.id, taxi_id, chosen_coordinate: chosen },
            &mut tx,
        )
        .await?;
        tx.commit().await?;
        debug!(
            "🔄️ Taxi order #{} authorized: '{}' for {}. Balance of {external_id} is now {}",
            order.id, taxi.name, taxi.price, debited.balance
        );
        Ok(order)
    }

    /// The debit and the credit happen in one transaction, so the total coin supply is conserved
    /// no matter where this call fails.
    async fn transfer(&self, sender: &str, recipient: &str, amount: Coins) -> Result<TransferOutcome, LedgerError> {
        if amount <= Coins::from(0) {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if sender == recipient {
            return Err(LedgerError::SelfTransfer);
        }
        let mut tx = self.pool.begin().await?;
        let from = players::fetch_player_by_external_id(sender, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::PlayerNotFound(sender.to_string()))?;
        let to = players::fetch_player_by_external_id(recipient, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::PlayerNotFound(recipient.to_string()))?;
        let debited = players::debit_if_sufficient(from.id, amount, &mut tx)
            .await?
            .ok_or(LedgerError::InsufficientFunds { required: amount, available: from.balance })?;
        let credited = players::credit(to.id, amount, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::PlayerNotFound(recipient.to_string()))?;
        tx.commit().await?;
        debug!("🔄️ Transferred {amount} from {sender} to {recipient}");
        Ok(TransferOutcome { amount, sender_balance: debited.balance, recipient_balance: credited.balance })
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn fetch_taxi_order(&self, order_id: i64) -> Result<Option<TaxiOrder>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(taxi_orders::fetch_taxi_order(order_id, &mut conn).await?)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(query, &mut conn).await?)
    }

    async fn fetch_pending_orders(&self, limit: i64) -> Result<Vec<PendingDelivery>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_pending_deliveries(limit, &mut conn).await
    }

    async fn fetch_pending_taxi_orders(&self, limit: i64) -> Result<Vec<PendingTaxiDelivery>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        taxi_orders::fetch_pending_taxi_deliveries(limit, &mut conn).await
    }

    async fn mark_order_delivered(&self, order_id: i64) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_status_guarded(order_id, OrderStatus::Delivered, None, &mut conn).await
    }

    async fn mark_order_failed(&self, order_id: i64, reason: &str) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_status_guarded(order_id, OrderStatus::Failed, Some(reason), &mut conn).await
    }

    async fn mark_taxi_order_delivered(&self, order_id: i64) -> Result<TaxiOrder, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        taxi_orders::update_status_guarded(order_id, OrderStatus::Delivered, None, &mut conn).await
    }

    async fn mark_taxi_order_failed(&self, order_id: i64, reason: &str) -> Result<TaxiOrder, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        taxi_orders::update_status_guarded(order_id, OrderStatus::Failed, Some(reason), &mut conn).await
    }

    async fn set_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_status_guarded(order_id, status, Some("Administrative override"), &mut conn).await
    }

    async fn check_rate_limit(&self, actor_id: &str, window: Duration) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        rate_limits::try_acquire(actor_id, window, &mut conn).await
    }
}

impl PlayerManagement for SqliteDatabase {
    async fn register_player(&self, player: NewPlayer) -> Result<Player, PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        let player = players::upsert_player(player, &mut conn).await?;
        trace!("🧑️ Player {} registered/refreshed", player.external_id);
        Ok(player)
    }

    async fn fetch_player(&self, external_id: &str) -> Result<Option<Player>, PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(players::fetch_player_by_external_id(external_id, &mut conn).await?)
    }

    async fn fetch_all_players(&self) -> Result<Vec<Player>, PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(players::fetch_all_players(&mut conn).await?)
    }

    async fn update_player(
        &self,
        external_id: &str,
        ingame_name: &str,
        balance: Coins,
    ) -> Result<Player, PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        players::update_player(external_id, ingame_name, balance, &mut conn)
            .await?
            .ok_or_else(|| PlayerApiError::PlayerNotFound(external_id.to_string()))
    }

    async fn delete_player(&self, external_id: &str) -> Result<(), PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = players::delete_player(external_id, &mut conn).await?;
        if removed == 0 {
            return Err(PlayerApiError::PlayerNotFound(external_id.to_string()));
        }
        info!("🧑️ Player {external_id} deleted, along with their orders");
        Ok(())
    }

    async fn balance_for(&self, external_id: &str) -> Result<Coins, PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        let player = players::fetch_player_by_external_id(external_id, &mut conn)
            .await?
            .ok_or_else(|| PlayerApiError::PlayerNotFound(external_id.to_string()))?;
        Ok(player.balance)
    }

    async fn order_history(&self, external_id: &str, limit: i64) -> Result<Vec<OrderHistoryEntry>, PlayerApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::order_history(external_id, limit, &mut conn).await?)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn add_item(&self, item: NewShopItem) -> Result<ShopItem, CatalogApiError> {
        CommandTemplate::validate_all(&item.content)?;
        let name = item.name.clone();
        let mut conn = self.pool.acquire().await?;
        let item = shop_items::insert_item(item, &mut conn).await.map_err(|e| map_unique(e, &name))?;
        info!("🗃️ Shop item '{}' added with id {}", item.name, item.id);
        Ok(item)
    }

    async fn update_item(&self, item_id: i64, item: NewShopItem) -> Result<ShopItem, CatalogApiError> {
        CommandTemplate::validate_all(&item.content)?;
        let name = item.name.clone();
        let mut conn = self.pool.acquire().await?;
        shop_items::update_item(item_id, item, &mut conn)
            .await
            .map_err(|e| map_unique(e, &name))?
            .ok_or(CatalogApiError::ItemNotFound(item_id))
    }

    async fn delete_item(&self, item_id: i64) -> Result<(), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = shop_items::delete_item(item_id, &mut conn).await?;
        if removed == 0 {
            return Err(CatalogApiError::ItemNotFound(item_id));
        }
        info!("🗃️ Shop item {item_id} deleted");
        Ok(())
    }

    async fn fetch_item(&self, item_id: i64) -> Result<Option<ShopItem>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(shop_items::fetch_item(item_id, &mut conn).await?)
    }

    async fn fetch_item_by_name(&self, name: &str) -> Result<Option<ShopItem>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(shop_items::fetch_item_by_name(name, &mut conn).await?)
    }

    async fn fetch_all_items(&self) -> Result<Vec<ShopItem>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(shop_items::fetch_all_items(&mut conn).await?)
    }

    /// Runs in one transaction: either the whole batch lands, or none of it does.
    async fn upsert_items(&self, items: Vec<NewShopItem>) -> Result<usize, CatalogApiError> {
        for item in &items {
            CommandTemplate::validate_all(&item.content)?;
        }
        let count = items.len();
        let mut tx = self.pool.begin().await?;
        for item in items {
            shop_items::upsert_item(item, &mut tx).await?;
        }
        tx.commit().await?;
        info!("🗃️ Catalog import: {count} items upserted");
        Ok(count)
    }

    async fn set_message_ref(
        &self,
        item_id: i64,
        message_ref: &str,
        channel_ref: &str,
    ) -> Result<(), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let updated = shop_items::set_message_ref(item_id, message_ref, channel_ref, &mut conn).await?;
        if updated == 0 {
            return Err(CatalogApiError::ItemNotFound(item_id));
        }
        Ok(())
    }

    async fn add_taxi(&self, taxi: NewTaxi) -> Result<Taxi, CatalogApiError> {
        let name = taxi.name.clone();
        let mut conn = self.pool.acquire().await?;
        let taxi = taxis::insert_taxi(taxi, &mut conn).await.map_err(|e| map_unique(e, &name))?;
        info!("🗃️ Taxi '{}' added with id {} ({} destinations)", taxi.name, taxi.id, taxi.coordinates.len());
        Ok(taxi)
    }

    async fn update_taxi(&self, taxi_id: i64, taxi: NewTaxi) -> Result<Taxi, CatalogApiError> {
        let name = taxi.name.clone();
        let mut conn = self.pool.acquire().await?;
        taxis::update_taxi(taxi_id, taxi, &mut conn)
            .await
            .map_err(|e| map_unique(e, &name))?
            .ok_or(CatalogApiError::TaxiNotFound(taxi_id))
    }

    async fn delete_taxi(&self, taxi_id: i64) -> Result<(), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = taxis::delete_taxi(taxi_id, &mut conn).await?;
        if removed == 0 {
            return Err(CatalogApiError::TaxiNotFound(taxi_id));
        }
        info!("🗃️ Taxi {taxi_id} deleted");
        Ok(())
    }

    async fn fetch_taxi(&self, taxi_id: i64) -> Result<Option<Taxi>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(taxis::fetch_taxi(taxi_id, &mut conn).await?)
    }

    async fn fetch_all_taxis(&self) -> Result<Vec<Taxi>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(taxis::fetch_all_taxis(&mut conn).await?)
    }
}

impl AuditManagement for SqliteDatabase {
    async fn record_audit(&self, admin_id: &str, action: &str, details: Option<&str>) -> Result<(), CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        audit::insert_audit(admin_id, action, details, &mut conn).await?;
        Ok(())
    }

    async fn recent_audit(&self, limit: i64) -> Result<Vec<AuditEntry>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(audit::recent_audit(limit, &mut conn).await?)
    }
}

impl LeaseManagement for SqliteDatabase {
    async fn acquire_lease(&self, instance_id: &str, ttl: Duration) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        lease::acquire(instance_id, ttl, &mut conn).await
    }

    async fn renew_lease(&self, instance_id: &str, ttl: Duration) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        lease::renew(instance_id, ttl, &mut conn).await
    }

    async fn release_lease(&self, instance_id: &str) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        lease::release(instance_id, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Connects and brings the schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        run_migrations(&pool).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn map_unique(e: sqlx::Error, name: &str) -> CatalogApiError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => CatalogApiError::DuplicateName(name.to_string()),
        _ => e.into(),
    }
}

use chrono::Duration;
use qm_common::Coins;
use thiserror::Error;

use crate::{
    commands::Coordinate,
    db_types::{Order, OrderStatus, TaxiOrder},
    traits::data_objects::{OrderQueryFilter, PendingDelivery, PendingTaxiDelivery, TransferOutcome},
};

/// The highest-level behaviour contract for Quartermaster backends.
///
/// Implementations must guarantee:
/// * Purchase authorization is a single atomic unit: the balance debit and the order insert
///   either both commit or neither does. The debit itself is conditional (decrement only when
///   the balance covers the total), so concurrent purchases on the same player can never drive
///   a balance negative.
/// * Transfers debit one row and credit the other inside one transaction.
/// * Order state transitions obey the state machine: `Pending` is the only non-terminal state,
///   and terminal orders reject further transitions with [`LedgerError::InvalidStatusChange`].
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Authorize a shop purchase for the player identified by `external_id`.
    ///
    /// Debits `price × quantity` from the player's balance and creates a `Pending` order,
    /// atomically, or fails without mutating anything.
    async fn authorize_purchase(
        &self,
        external_id: &str,
        item_name: &str,
        quantity: i64,
    ) -> Result<Order, LedgerError>;

    /// Authorize a taxi ride for the player identified by `external_id`.
    ///
    /// If `chosen` is provided it must be one of the taxi's configured destinations. A taxi with
    /// no destinations can still be ordered; the dispatcher will fail the order at delivery time.
    async fn authorize_taxi_order(
        &self,
        external_id: &str,
        taxi_id: i64,
        chosen: Option<Coordinate>,
    ) -> Result<TaxiOrder, LedgerError>;

    /// Move `amount` coins from `sender` to `recipient` (both external ids), atomically.
    async fn transfer(&self, sender: &str, recipient: &str, amount: Coins) -> Result<TransferOutcome, LedgerError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerError>;

    async fn fetch_taxi_order(&self, order_id: i64) -> Result<Option<TaxiOrder>, LedgerError>;

    /// Fetch orders matching the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerError>;

    /// Fetch up to `limit` `Pending` shop orders, oldest first, joined with the player and item
    /// context the dispatcher needs to render the delivery sequence.
    async fn fetch_pending_orders(&self, limit: i64) -> Result<Vec<PendingDelivery>, LedgerError>;

    /// Fetch up to `limit` `Pending` taxi orders, oldest first, with player and taxi context.
    async fn fetch_pending_taxi_orders(&self, limit: i64) -> Result<Vec<PendingTaxiDelivery>, LedgerError>;

    /// Transition a `Pending` shop order to `Delivered`.
    async fn mark_order_delivered(&self, order_id: i64) -> Result<Order, LedgerError>;

    /// Transition a `Pending` shop order to `Failed` with a reason.
    async fn mark_order_failed(&self, order_id: i64, reason: &str) -> Result<Order, LedgerError>;

    /// Transition a `Pending` taxi order to `Delivered` and stamp `completed_at`.
    async fn mark_taxi_order_delivered(&self, order_id: i64) -> Result<TaxiOrder, LedgerError>;

    /// Transition a `Pending` taxi order to `Failed` with a reason.
    async fn mark_taxi_order_failed(&self, order_id: i64, reason: &str) -> Result<TaxiOrder, LedgerError>;

    /// Administrative status override for a shop order. The state-machine guard still applies.
    async fn set_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, LedgerError>;

    /// Record an attempt against the persisted cooldown for `actor_id`.
    ///
    /// Returns `Ok(())` if the actor was outside their cooldown window (a new window is started),
    /// or [`LedgerError::RateLimited`] if a live window exists. A single UPSERT keyed by actor,
    /// so the check holds across restarts and across the bot/server/dispatcher processes.
    async fn check_rate_limit(&self, actor_id: &str, window: Duration) -> Result<(), LedgerError>;
}

/// Lease bookkeeping for the delivery dispatcher.
///
/// The game console is a singleton resource. The dispatcher acquires a short-lived lease row at
/// startup and refreshes it each poll cycle; a second instance finding a live foreign lease must
/// refuse to run.
#[allow(async_fn_in_trait)]
pub trait LeaseManagement: Clone {
    /// Try to acquire (or re-acquire) the dispatcher lease for `instance_id`. Returns the holder
    /// id on failure.
    async fn acquire_lease(&self, instance_id: &str, ttl: Duration) -> Result<(), LedgerError>;

    /// Extend a lease held by `instance_id`. Fails if the lease was lost.
    async fn renew_lease(&self, instance_id: &str, ttl: Duration) -> Result<(), LedgerError>;

    /// Release the lease if held by `instance_id`.
    async fn release_lease(&self, instance_id: &str) -> Result<(), LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("No shop item named '{0}' exists")]
    ItemNotFound(String),
    #[error("No taxi with id {0} exists")]
    TaxiNotFound(i64),
    #[error("No player registered for '{0}'")]
    PlayerNotFound(String),
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
    #[error("Transfer amount must be positive, got {0}")]
    InvalidAmount(Coins),
    #[error("Insufficient funds: {required} required, {available} available")]
    InsufficientFunds { required: Coins, available: Coins },
    #[error("Cannot transfer coins to yourself")]
    SelfTransfer,
    #[error("Too many requests. Try again in {0} seconds")]
    RateLimited(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Invalid status change from {from} to {to}")]
    InvalidStatusChange { from: OrderStatus, to: OrderStatus },
    #[error("The coordinate is not one of the taxi's destinations: {0}")]
    InvalidCoordinate(String),
    #[error("The dispatcher lease is held by another instance: {0}")]
    LeaseHeld(String),
    #[error("Stored payload could not be decoded: {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::CorruptRecord(e.to_string())
    }
}

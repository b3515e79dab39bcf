use std::fmt::Debug;

use chrono::Duration;
use log::*;
use qm_common::Coins;

use crate::{
    commands::Coordinate,
    db_types::{Order, OrderStatus, TaxiOrder},
    events::{EventProducers, OrderCreatedEvent},
    traits::{LedgerDatabase, LedgerError, OrderQueryFilter, TransferOutcome},
};

/// `OrderFlowApi` is the primary API for moving coins: purchases, taxi rides and transfers.
///
/// All money movement is delegated to the backend, which performs it atomically. This layer adds
/// the persisted cooldown check in front of spending operations, and fires the order-created
/// hook once an authorization lands.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: LedgerDatabase
{
    /// Authorize a shop purchase.
    ///
    /// If `cooldown` is given, the player must be outside their cooldown window; a successful
    /// authorization starts a new window. The debit and the `Pending` order land atomically, and
    /// the order-created hook fires only after the transaction has committed.
    pub async fn purchase(
        &self,
        external_id: &str,
        item_name: &str,
        quantity: i64,
        cooldown: Option<Duration>,
    ) -> Result<Order, LedgerError> {
        if let Some(window) = cooldown {
            self.db.check_rate_limit(external_id, window).await?;
        }
        let order = self.db.authorize_purchase(external_id, item_name, quantity).await?;
        self.call_order_created_hook(&order, item_name, external_id).await;
        info!("🔄️📦️ Purchase authorized for {external_id}: order #{} ({} × '{item_name}')", order.id, quantity);
        Ok(order)
    }

    /// Authorize a taxi ride. The same cooldown window as purchases applies.
    pub async fn order_taxi(
        &self,
        external_id: &str,
        taxi_id: i64,
        chosen: Option<Coordinate>,
        cooldown: Option<Duration>,
    ) -> Result<TaxiOrder, LedgerError> {
        if let Some(window) = cooldown {
            self.db.check_rate_limit(external_id, window).await?;
        }
        let order = self.db.authorize_taxi_order(external_id, taxi_id, chosen).await?;
        info!("🔄️🚕️ Taxi ride authorized for {external_id}: order #{}", order.id);
        Ok(order)
    }

    /// Move coins between two players. Transfers are not subject to the purchase cooldown.
    pub async fn transfer(
        &self,
        sender: &str,
        recipient: &str,
        amount: Coins,
    ) -> Result<TransferOutcome, LedgerError> {
        let outcome = self.db.transfer(sender, recipient, amount).await?;
        info!("🔄️💸️ {sender} sent {amount} to {recipient}");
        Ok(outcome)
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn fetch_taxi_order(&self, order_id: i64) -> Result<Option<TaxiOrder>, LedgerError> {
        self.db.fetch_taxi_order(order_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerError> {
        self.db.search_orders(query).await
    }

    /// Administrative status override. The state machine still applies: terminal orders refuse to
    /// move.
    pub async fn set_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, LedgerError> {
        let order = self.db.set_order_status(order_id, status).await?;
        warn!("🔄️ Order #{order_id} status manually set to {status}");
        Ok(order)
    }

    async fn call_order_created_hook(&self, order: &Order, item_name: &str, external_id: &str) {
        for emitter in &self.producers.order_created_producer {
            trace!("🔄️📦️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(order.clone(), item_name.to_string(), external_id.to_string());
            emitter.publish_event(event).await;
        }
    }
}

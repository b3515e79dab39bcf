use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{Order, TaxiOrder},
    events::{EventProducers, OrderDeliveredEvent, OrderFailedEvent, TaxiOrderCompletedEvent},
    traits::{LeaseManagement, LedgerDatabase, LedgerError, PendingDelivery, PendingTaxiDelivery},
};

/// The dispatcher's view of the ledger: pending work, terminal transitions, and the singleton
/// lease.
///
/// An order only becomes `Delivered` when the dispatcher reports that the *entire* command
/// sequence was issued. Anything less goes through [`Self::fail_order`] (with a reason) or is
/// left `Pending` for the next poll.
pub struct DispatchApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for DispatchApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DispatchApi")
    }
}

impl<B> DispatchApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> DispatchApi<B>
where B: LedgerDatabase
{
    /// The oldest `Pending` shop orders, with full delivery context.
    pub async fn poll_shop_orders(&self, limit: i64) -> Result<Vec<PendingDelivery>, LedgerError> {
        let pending = self.db.fetch_pending_orders(limit).await?;
        if !pending.is_empty() {
            debug!("🚚️ {} pending shop order(s) picked up", pending.len());
        }
        Ok(pending)
    }

    /// The oldest `Pending` taxi orders, with full delivery context.
    pub async fn poll_taxi_orders(&self, limit: i64) -> Result<Vec<PendingTaxiDelivery>, LedgerError> {
        let pending = self.db.fetch_pending_taxi_orders(limit).await?;
        if !pending.is_empty() {
            debug!("🚚️ {} pending taxi order(s) picked up", pending.len());
        }
        Ok(pending)
    }

    pub async fn complete_order(&self, order_id: i64) -> Result<Order, LedgerError> {
        let order = self.db.mark_order_delivered(order_id).await?;
        info!("🚚️ Order #{order_id} delivered");
        for emitter in &self.producers.order_delivered_producer {
            emitter.publish_event(OrderDeliveredEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    pub async fn fail_order(&self, order_id: i64, reason: &str) -> Result<Order, LedgerError> {
        let order = self.db.mark_order_failed(order_id, reason).await?;
        warn!("🚚️ Order #{order_id} failed: {reason}");
        for emitter in &self.producers.order_failed_producer {
            emitter.publish_event(OrderFailedEvent::new(order.clone(), reason.to_string())).await;
        }
        Ok(order)
    }

    pub async fn complete_taxi_order(&self, order_id: i64) -> Result<TaxiOrder, LedgerError> {
        let order = self.db.mark_taxi_order_delivered(order_id).await?;
        info!("🚚️ Taxi order #{order_id} delivered");
        for emitter in &self.producers.taxi_completed_producer {
            emitter.publish_event(TaxiOrderCompletedEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    pub async fn fail_taxi_order(&self, order_id: i64, reason: &str) -> Result<TaxiOrder, LedgerError> {
        let order = self.db.mark_taxi_order_failed(order_id, reason).await?;
        warn!("🚚️ Taxi order #{order_id} failed: {reason}");
        for emitter in &self.producers.taxi_completed_producer {
            emitter.publish_event(TaxiOrderCompletedEvent::new(order.clone())).await;
        }
        Ok(order)
    }
}

impl<B> DispatchApi<B>
where B: LeaseManagement
{
    pub async fn acquire_lease(&self, instance_id: &str, ttl: Duration) -> Result<(), LedgerError> {
        self.db.acquire_lease(instance_id, ttl).await
    }

    pub async fn renew_lease(&self, instance_id: &str, ttl: Duration) -> Result<(), LedgerError> {
        self.db.renew_lease(instance_id, ttl).await
    }

    pub async fn release_lease(&self, instance_id: &str) -> Result<(), LedgerError> {
        self.db.release_lease(instance_id).await
    }
}

//! The delivery poll loop.
//!
//! Every cycle the worker claims a bounded, oldest-first batch of pending shop orders, then the
//! taxi batch, drives the actuator through each delivery sequence, and parks the drone back at
//! staging. An order becomes `Delivered` only after its *whole* sequence has been issued: a
//! timeout fails the order, and any other actuator fault halts the loop with the order still
//! `Pending`, so a restarted dispatcher redelivers it safely.

use log::*;
use quartermaster_engine::{
    commands::{CommandContext, CommandTemplate, ConsoleCommand, Coordinate},
    events::EventProducers,
    traits::{PendingDelivery, PendingTaxiDelivery},
    DispatchApi,
    SqliteDatabase,
};
use rand::seq::SliceRandom;
use tokio::time::timeout;

use crate::{
    actuator::{Actuator, ActuatorError},
    config::DispatcherConfig,
    errors::DispatchError,
};

const NO_COORDINATES_REASON: &str = "no coordinates configured";
const TIMEOUT_REASON: &str = "Console command timed out";

pub struct DeliveryWorker<A> {
    api: DispatchApi<SqliteDatabase>,
    actuator: A,
    config: DispatcherConfig,
}

impl<A: Actuator> DeliveryWorker<A> {
    pub fn new(db: SqliteDatabase, actuator: A, config: DispatcherConfig) -> Self {
        let api = DispatchApi::new(db, EventProducers::default());
        Self { api, actuator, config }
    }

    /// Runs until an actuator fault or a lost lease. Database errors skip to the next cycle.
    pub async fn run(&mut self) -> Result<(), DispatchError> {
        let mut timer = tokio::time::interval(self.config.poll_interval);
        info!("🚚️ Delivery worker started, polling every {:?}", self.config.poll_interval);
        loop {
            timer.tick().await;
            if let Err(e) = self.api.renew_lease(&self.config.instance_id, self.config.lease_ttl).await {
                error!("🚚️ Lost the dispatcher lease: {e}");
                return Err(e.into());
            }
            match self.run_once().await {
                Ok(0) => trace!("🚚️ No pending orders"),
                Ok(n) => info!("🚚️ {n} order(s) processed this cycle"),
                Err(DispatchError::Ledger(e)) => {
                    warn!("🚚️ Database error, skipping this cycle: {e}");
                },
                Err(e) => {
                    error!("🚚️ Halting: {e}");
                    return Err(e);
                },
            }
        }
    }

    /// One poll cycle: the shop batch, then the taxi batch, then back to staging. Exposed so the
    /// cycle can be driven directly in tests.
    pub async fn run_once(&mut self) -> Result<usize, DispatchError> {
        let shop = self.api.poll_shop_orders(self.config.batch_size).await?;
        let taxis = self.api.poll_taxi_orders(self.config.batch_size).await?;
        if shop.is_empty() && taxis.is_empty() {
            return Ok(0);
        }
        let mut processed = 0;
        for delivery in &shop {
            self.deliver_order(delivery).await?;
            processed += 1;
        }
        for delivery in &taxis {
            self.deliver_taxi_order(delivery).await?;
            processed += 1;
        }
        match timeout(self.config.actuator.timeout, self.actuator.return_to_staging()).await {
            Ok(Ok(())) => {},
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => warn!("🚚️ Staging teleport timed out; continuing"),
        }
        Ok(processed)
    }

    pub async fn shutdown(&mut self) {
        if let Err(e) = self.actuator.close().await {
            warn!("🚚️ Error closing the console session: {e}");
        }
        if let Err(e) = self.api.release_lease(&self.config.instance_id).await {
            warn!("🚚️ Error releasing the dispatcher lease: {e}");
        }
    }

    /// `#teleportto <player>`, then the item's rendered content commands.
    async fn deliver_order(&mut self, delivery: &PendingDelivery) -> Result<(), DispatchError> {
        let order_id = delivery.order.id;
        info!("🚚️📦️ Delivering order #{order_id}: '{}' for {}", delivery.item_name, delivery.ingame_name);
        let ctx = CommandContext { player: &delivery.ingame_name };
        let mut sequence = vec![CommandTemplate::TeleportToPlayer.render(&ctx)];
        sequence.extend(delivery.content.iter().map(|t| t.render(&ctx)));
        match self.issue_all(&sequence).await {
            Ok(()) => {
                self.api.complete_order(order_id).await?;
                Ok(())
            },
            Err(ActuatorError::Timeout) => {
                self.api.fail_order(order_id, TIMEOUT_REASON).await?;
                Ok(())
            },
            // The order stays Pending; whoever holds the lease next redelivers it.
            Err(e) => Err(e.into()),
        }
    }

    /// `#teleport <coord>` to the destination, then `#teleporttome <player>`.
    async fn deliver_taxi_order(&mut self, delivery: &PendingTaxiDelivery) -> Result<(), DispatchError> {
        let order_id = delivery.order.id;
        let Some(destination) = pick_destination(delivery) else {
            warn!("🚚️🚕️ Taxi order #{order_id} has no destinations. Failing it.");
            self.api.fail_taxi_order(order_id, NO_COORDINATES_REASON).await?;
            return Ok(());
        };
        info!("🚚️🚕️ Taxi order #{order_id}: {} to {destination}", delivery.ingame_name);
        let ctx = CommandContext { player: &delivery.ingame_name };
        let sequence =
            [CommandTemplate::Teleport { location: destination }.render(&ctx), CommandTemplate::PullPlayerToMe.render(&ctx)];
        match self.issue_all(&sequence).await {
            Ok(()) => {
                self.api.complete_taxi_order(order_id).await?;
                Ok(())
            },
            Err(ActuatorError::Timeout) => {
                self.api.fail_taxi_order(order_id, TIMEOUT_REASON).await?;
                Ok(())
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn issue_all(&mut self, sequence: &[ConsoleCommand]) -> Result<(), ActuatorError> {
        for command in sequence {
            timeout(self.config.actuator.timeout, self.actuator.issue(command))
                .await
                .map_err(|_| ActuatorError::Timeout)??;
        }
        Ok(())
    }
}

/// The player's explicit choice wins; otherwise pick uniformly from the taxi's set.
fn pick_destination(delivery: &PendingTaxiDelivery) -> Option<Coordinate> {
    delivery.order.chosen_coordinate.or_else(|| delivery.coordinates.choose(&mut rand::thread_rng()).copied())
}

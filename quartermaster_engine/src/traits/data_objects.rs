use chrono::{DateTime, Utc};
use qm_common::Coins;
use serde::{Deserialize, Serialize};

use crate::{
    commands::{CommandTemplate, Coordinate},
    db_types::{Order, OrderStatus, TaxiOrder},
};

/// A `Pending` shop order joined with everything the dispatcher needs to deliver it.
#[derive(Debug, Clone)]
pub struct PendingDelivery {
    pub order: Order,
    /// The in-game name delivery commands are rendered with.
    pub ingame_name: String,
    pub external_id: String,
    pub item_name: String,
    pub content: Vec<CommandTemplate>,
}

/// A `Pending` taxi order joined with the taxi's destination set and player context.
#[derive(Debug, Clone)]
pub struct PendingTaxiDelivery {
    pub order: TaxiOrder,
    pub ingame_name: String,
    pub external_id: String,
    pub taxi_name: String,
    pub coordinates: Vec<Coordinate>,
}

/// Post-transfer balances, conserved by construction: the debit and credit happen in one
/// transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub amount: Coins,
    pub sender_balance: Coins,
    pub recipient_balance: Coins,
}

/// Search criteria for order listings on the admin surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub status: Option<OrderStatus>,
    pub external_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.external_id.is_none() && self.since.is_none() && self.until.is_none()
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_external_id<S: Into<String>>(mut self, external_id: S) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// One line of a player's purchase history, as shown on the chat surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
    pub order_id: i64,
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub total_price: Coins,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

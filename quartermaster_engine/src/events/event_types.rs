use serde::{Deserialize, Serialize};

use crate::db_types::{Order, TaxiOrder};

/// Fired when a purchase has been authorized and a `Pending` order created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub item_name: String,
    pub external_id: String,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, item_name: String, external_id: String) -> Self {
        Self { order, item_name, external_id }
    }
}

/// Fired when the dispatcher has issued the full delivery sequence for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDeliveredEvent {
    pub order: Order,
}

impl OrderDeliveredEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when delivery was abandoned. The reason is also stored on the order row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFailedEvent {
    pub order: Order,
    pub reason: String,
}

impl OrderFailedEvent {
    pub fn new(order: Order, reason: String) -> Self {
        Self { order, reason }
    }
}

/// Fired when a taxi ride reaches a terminal state, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxiOrderCompletedEvent {
    pub order: TaxiOrder,
}

impl TaxiOrderCompletedEvent {
    pub fn new(order: TaxiOrder) -> Self {
        Self { order }
    }
}

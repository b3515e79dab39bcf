//! Request and response payloads for the JSON API.

use qm_common::Coins;
use quartermaster_engine::{commands::Coordinate, db_types::OrderStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub external_id: String,
    pub item_name: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxiOrderRequest {
    pub external_id: String,
    pub taxi_id: i64,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    pub amount: Coins,
}

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlayerRequest {
    pub ingame_name: Option<String>,
    pub balance: Option<Coins>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub external_id: String,
    pub balance: Coins,
}

/// A catalog write plus the outcome of the relay push. The write always commits; a relay failure
/// only surfaces here and in the logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayedResponse<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImportResponse {
    pub items: usize,
    pub taxis: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

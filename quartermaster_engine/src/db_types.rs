//! Public data types for the Quartermaster database.
//!
//! These types are shared between the engine, the admin server and the delivery dispatcher.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use qm_common::Coins;

use crate::commands::{CommandTemplate, Coordinate};

//--------------------------------------    OrderStatus     ----------------------------------------------------------
/// The lifecycle of an order (shop or taxi).
///
/// `Pending` is the only non-terminal state. The dispatcher moves orders to `Delivered` or
/// `Failed`; once terminal, an order is never picked up again and no further transition is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Funds have been reserved and the order is awaiting delivery.
    Pending,
    /// The full command sequence was issued to the game console.
    Delivered,
    /// Delivery was abandoned; the `reason` column explains why.
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(pub String);

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Delivered" => Ok(Self::Delivered),
            "Failed" => Ok(Self::Failed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status in database: {value}. Defaulting to Pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------      Player        ----------------------------------------------------------
/// A registered player. `external_id` is the chat-platform account id; `ingame_name` is the
/// name the game console knows the player by, and is what delivery commands are rendered with.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub external_id: String,
    pub ingame_name: String,
    pub display_name: String,
    pub balance: Coins,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlayer {
    pub external_id: String,
    pub ingame_name: String,
    #[serde(default)]
    pub display_name: String,
}

impl NewPlayer {
    pub fn new<S: Into<String>>(external_id: S, ingame_name: S) -> Self {
        Self { external_id: external_id.into(), ingame_name: ingame_name.into(), display_name: String::new() }
    }
}

//--------------------------------------     ShopItem       ----------------------------------------------------------
/// A purchasable catalog entry. `content` is the ordered list of command templates issued on
/// delivery. `message_ref`/`channel_ref` locate the listing posted on the chat surface so it can
/// be updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: Coins,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub content: Vec<CommandTemplate>,
    pub message_ref: Option<String>,
    pub channel_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShopItem {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub price: Coins,
    pub image_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub content: Vec<CommandTemplate>,
}

fn default_category() -> String {
    "Misc".to_string()
}

//--------------------------------------       Order        ----------------------------------------------------------
/// A shop purchase. `total_price` is fixed at purchase time (item price × quantity) and is never
/// re-priced when the catalog changes.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub player_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub total_price: Coins,
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub player_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub total_price: Coins,
}

//--------------------------------------       Taxi         ----------------------------------------------------------
/// A taxi route: a named, priced set of destinations. Delivery teleports the drone to a
/// destination and pulls the player to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxi {
    pub id: i64,
    pub name: String,
    pub price: Coins,
    pub coordinates: Vec<Coordinate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaxi {
    pub name: String,
    pub price: Coins,
    pub coordinates: Vec<Coordinate>,
}

//--------------------------------------     TaxiOrder      ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxiOrder {
    pub id: i64,
    pub player_id: i64,
    pub taxi_id: i64,
    /// The destination the player picked, if any. `None` means the dispatcher picks one at
    /// random from the taxi's configured set at delivery time.
    pub chosen_coordinate: Option<Coordinate>,
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTaxiOrder {
    pub player_id: i64,
    pub taxi_id: i64,
    pub chosen_coordinate: Option<Coordinate>,
}

//--------------------------------------     AuditEntry     ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub admin_id: String,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

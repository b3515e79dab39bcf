use thiserror::Error;

use crate::{
    commands::CommandValidationError,
    db_types::{AuditEntry, NewShopItem, NewTaxi, ShopItem, Taxi},
};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No shop item with id {0} exists")]
    ItemNotFound(i64),
    #[error("No shop item named '{0}' exists")]
    ItemNameNotFound(String),
    #[error("No taxi with id {0} exists")]
    TaxiNotFound(i64),
    #[error("A shop item named '{0}' already exists")]
    DuplicateName(String),
    #[error("Invalid delivery sequence: {0}")]
    InvalidContent(#[from] CommandValidationError),
    #[error("Stored payload could not be decoded: {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for CatalogApiError {
    fn from(e: serde_json::Error) -> Self {
        CatalogApiError::CorruptRecord(e.to_string())
    }
}

/// CRUD for the purchasable catalog: shop items and taxis.
///
/// Item names are unique case-insensitively. Delivery content is validated with
/// [`CommandTemplate::validate_all`](crate::commands::CommandTemplate::validate_all) before any
/// write, so the dispatcher never sees a malformed sequence. `upsert_items` is the idempotent
/// import path: replaying the same payload leaves exactly one entry per name.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn add_item(&self, item: NewShopItem) -> Result<ShopItem, CatalogApiError>;

    async fn update_item(&self, item_id: i64, item: NewShopItem) -> Result<ShopItem, CatalogApiError>;

    /// Removes the item. Dependent orders are removed by cascade.
    async fn delete_item(&self, item_id: i64) -> Result<(), CatalogApiError>;

    async fn fetch_item(&self, item_id: i64) -> Result<Option<ShopItem>, CatalogApiError>;

    /// Case-insensitive name lookup.
    async fn fetch_item_by_name(&self, name: &str) -> Result<Option<ShopItem>, CatalogApiError>;

    async fn fetch_all_items(&self) -> Result<Vec<ShopItem>, CatalogApiError>;

    /// Insert-or-update by name. Returns the number of items written.
    async fn upsert_items(&self, items: Vec<NewShopItem>) -> Result<usize, CatalogApiError>;

    /// Records where the listing for this item was posted on the chat surface, so later edits
    /// can update the listing in place.
    async fn set_message_ref(&self, item_id: i64, message_ref: &str, channel_ref: &str)
        -> Result<(), CatalogApiError>;

    async fn add_taxi(&self, taxi: NewTaxi) -> Result<Taxi, CatalogApiError>;

    async fn update_taxi(&self, taxi_id: i64, taxi: NewTaxi) -> Result<Taxi, CatalogApiError>;

    async fn delete_taxi(&self, taxi_id: i64) -> Result<(), CatalogApiError>;

    async fn fetch_taxi(&self, taxi_id: i64) -> Result<Option<Taxi>, CatalogApiError>;

    async fn fetch_all_taxis(&self) -> Result<Vec<Taxi>, CatalogApiError>;
}

/// Append-only administrative audit trail.
#[allow(async_fn_in_trait)]
pub trait AuditManagement {
    async fn record_audit(&self, admin_id: &str, action: &str, details: Option<&str>)
        -> Result<(), CatalogApiError>;

    async fn recent_audit(&self, limit: i64) -> Result<Vec<AuditEntry>, CatalogApiError>;
}

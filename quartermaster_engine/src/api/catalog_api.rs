//! Catalog management API: shop items, taxis, and JSON import/export.

use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{AuditEntry, NewShopItem, NewTaxi, ShopItem, Taxi},
    traits::{AuditManagement, CatalogApiError, CatalogManagement},
};

/// The portable catalog snapshot used by the admin panel's export and import buttons.
///
/// Import is idempotent: items and taxis are matched by name, so replaying the same file leaves
/// the catalog unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogExport {
    #[serde(default)]
    pub items: Vec<NewShopItem>,
    #[serde(default)]
    pub taxis: Vec<NewTaxi>,
}

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn add_item(&self, item: NewShopItem) -> Result<ShopItem, CatalogApiError> {
        self.db.add_item(item).await
    }

    pub async fn update_item(&self, item_id: i64, item: NewShopItem) -> Result<ShopItem, CatalogApiError> {
        self.db.update_item(item_id, item).await
    }

    pub async fn delete_item(&self, item_id: i64) -> Result<(), CatalogApiError> {
        self.db.delete_item(item_id).await
    }

    pub async fn item(&self, item_id: i64) -> Result<Option<ShopItem>, CatalogApiError> {
        self.db.fetch_item(item_id).await
    }

    pub async fn item_by_name(&self, name: &str) -> Result<Option<ShopItem>, CatalogApiError> {
        self.db.fetch_item_by_name(name).await
    }

    pub async fn all_items(&self) -> Result<Vec<ShopItem>, CatalogApiError> {
        self.db.fetch_all_items().await
    }

    pub async fn set_message_ref(
        &self,
        item_id: i64,
        message_ref: &str,
        channel_ref: &str,
    ) -> Result<(), CatalogApiError> {
        self.db.set_message_ref(item_id, message_ref, channel_ref).await
    }

    pub async fn add_taxi(&self, taxi: NewTaxi) -> Result<Taxi, CatalogApiError> {
        self.db.add_taxi(taxi).await
    }

    pub async fn update_taxi(&self, taxi_id: i64, taxi: NewTaxi) -> Result<Taxi, CatalogApiError> {
        self.db.update_taxi(taxi_id, taxi).await
    }

    pub async fn delete_taxi(&self, taxi_id: i64) -> Result<(), CatalogApiError> {
        self.db.delete_taxi(taxi_id).await
    }

    pub async fn taxi(&self, taxi_id: i64) -> Result<Option<Taxi>, CatalogApiError> {
        self.db.fetch_taxi(taxi_id).await
    }

    pub async fn all_taxis(&self) -> Result<Vec<Taxi>, CatalogApiError> {
        self.db.fetch_all_taxis().await
    }

    /// Snapshots the whole catalog into a portable form, with database ids and chat-surface
    /// references stripped.
    pub async fn export(&self) -> Result<CatalogExport, CatalogApiError> {
        let items = self
            .db
            .fetch_all_items()
            .await?
            .into_iter()
            .map(|i| NewShopItem {
                name: i.name,
                category: i.category,
                price: i.price,
                image_url: i.image_url,
                description: i.description,
                content: i.content,
            })
            .collect();
        let taxis = self
            .db
            .fetch_all_taxis()
            .await?
            .into_iter()
            .map(|t| NewTaxi { name: t.name, price: t.price, coordinates: t.coordinates })
            .collect();
        Ok(CatalogExport { items, taxis })
    }

    /// Applies a catalog snapshot. Items are upserted by name in one transaction; taxis are
    /// matched by name individually. Returns `(items, taxis)` written.
    pub async fn import(&self, snapshot: CatalogExport) -> Result<(usize, usize), CatalogApiError> {
        let item_count = if snapshot.items.is_empty() { 0 } else { self.db.upsert_items(snapshot.items).await? };
        let mut taxi_count = 0;
        if !snapshot.taxis.is_empty() {
            let existing = self.db.fetch_all_taxis().await?;
            for taxi in snapshot.taxis {
                match existing.iter().find(|t| t.name.eq_ignore_ascii_case(&taxi.name)) {
                    Some(current) => {
                        self.db.update_taxi(current.id, taxi).await?;
                    },
                    None => {
                        self.db.add_taxi(taxi).await?;
                    },
                }
                taxi_count += 1;
            }
        }
        info!("🗃️ Catalog import complete: {item_count} items, {taxi_count} taxis");
        Ok((item_count, taxi_count))
    }
}

impl<B> CatalogApi<B>
where B: AuditManagement
{
    pub async fn record_audit(&self, admin_id: &str, action: &str, details: Option<&str>) -> Result<(), CatalogApiError> {
        self.db.record_audit(admin_id, action, details).await
    }

    pub async fn recent_audit(&self, limit: i64) -> Result<Vec<AuditEntry>, CatalogApiError> {
        self.db.recent_audit(limit).await
    }
}

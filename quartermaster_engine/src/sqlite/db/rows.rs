//! Manual row mappings for records that carry JSON columns.
//!
//! `shop_items.content`, `taxis.coordinates` and `taxi_orders.chosen_coordinate` are stored as
//! JSON text. Decoding happens here, inside `FromRow`, so every query site can keep using
//! `query_as` and a corrupt column surfaces as an ordinary sqlx decode error.

use serde::de::DeserializeOwned;
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use crate::db_types::{ShopItem, Taxi, TaxiOrder};

fn json_column<T: DeserializeOwned>(row: &SqliteRow, col: &str) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(col)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode { index: col.to_string(), source: Box::new(e) })
}

impl FromRow<'_, SqliteRow> for ShopItem {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            price: row.try_get("price")?,
            image_url: row.try_get("image_url")?,
            description: row.try_get("description")?,
            content: json_column(row, "content")?,
            message_ref: row.try_get("message_ref")?,
            channel_ref: row.try_get("channel_ref")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, SqliteRow> for Taxi {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            coordinates: json_column(row, "coordinates")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FromRow<'_, SqliteRow> for TaxiOrder {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let chosen: Option<String> = row.try_get("chosen_coordinate")?;
        let chosen_coordinate = chosen
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "chosen_coordinate".to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()?;
        Ok(Self {
            id: row.try_get("id")?,
            player_id: row.try_get("player_id")?,
            taxi_id: row.try_get("taxi_id")?,
            chosen_coordinate,
            status: row.try_get::<String, _>("status")?.into(),
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }
}

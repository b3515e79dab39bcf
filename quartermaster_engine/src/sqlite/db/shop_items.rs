use log::trace;
use qm_common::Coins;
use sqlx::SqliteConnection;

use crate::db_types::{NewShopItem, ShopItem};

/// Inserts a new catalog item. Content is stored as a JSON array of command templates.
/// The name column has a case-insensitive unique constraint, so a duplicate name surfaces as a
/// unique violation.
pub async fn insert_item(item: NewShopItem, conn: &mut SqliteConnection) -> Result<ShopItem, sqlx::Error> {
    let content = serialize_content(&item)?;
    let item = sqlx::query_as(
        r#"
            INSERT INTO shop_items (name, category, price, image_url, description, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(item.name)
    .bind(item.category)
    .bind(item.price)
    .bind(item.image_url)
    .bind(item.description)
    .bind(content)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn update_item(
    item_id: i64,
    item: NewShopItem,
    conn: &mut SqliteConnection,
) -> Result<Option<ShopItem>, sqlx::Error> {
    let content = serialize_content(&item)?;
    sqlx::query_as(
        r#"
            UPDATE shop_items SET
                name = $1, category = $2, price = $3, image_url = $4, description = $5, content = $6,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $7
            RETURNING *;
        "#,
    )
    .bind(item.name)
    .bind(item.category)
    .bind(item.price)
    .bind(item.image_url)
    .bind(item.description)
    .bind(content)
    .bind(item_id)
    .fetch_optional(conn)
    .await
}

/// Insert-or-update keyed by name. This is what makes catalog imports and the relay idempotent:
/// replaying the same item leaves exactly one row behind.
pub async fn upsert_item(item: NewShopItem, conn: &mut SqliteConnection) -> Result<ShopItem, sqlx::Error> {
    let content = serialize_content(&item)?;
    let item = sqlx::query_as(
        r#"
            INSERT INTO shop_items (name, category, price, image_url, description, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE SET
                category = excluded.category,
                price = excluded.price,
                image_url = excluded.image_url,
                description = excluded.description,
                content = excluded.content,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(item.name)
    .bind(item.category)
    .bind(item.price)
    .bind(item.image_url)
    .bind(item.description)
    .bind(content)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn delete_item(item_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM shop_items WHERE id = $1").bind(item_id).execute(conn).await?;
    Ok(res.rows_affected())
}

pub async fn fetch_item(item_id: i64, conn: &mut SqliteConnection) -> Result<Option<ShopItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shop_items WHERE id = $1").bind(item_id).fetch_optional(conn).await
}

/// Case-insensitive: the name column collates NOCASE.
pub async fn fetch_item_by_name(name: &str, conn: &mut SqliteConnection) -> Result<Option<ShopItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shop_items WHERE name = $1").bind(name).fetch_optional(conn).await
}

pub async fn fetch_all_items(conn: &mut SqliteConnection) -> Result<Vec<ShopItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shop_items ORDER BY category ASC, name ASC").fetch_all(conn).await
}

/// The minimal projection a purchase authorization needs. The delivery content is not decoded
/// here; the dispatcher fetches it when the order is picked up.
pub async fn fetch_item_for_purchase(
    name: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<(i64, Coins)>, sqlx::Error> {
    let row: Option<(i64, Coins)> =
        sqlx::query_as("SELECT id, price FROM shop_items WHERE name = $1").bind(name).fetch_optional(conn).await?;
    trace!("🗃️ Purchase lookup for '{name}': {row:?}");
    Ok(row)
}

pub async fn set_message_ref(
    item_id: i64,
    message_ref: &str,
    channel_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE shop_items SET message_ref = $1, channel_ref = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
    )
    .bind(message_ref)
    .bind(channel_ref)
    .bind(item_id)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

fn serialize_content(item: &NewShopItem) -> Result<String, sqlx::Error> {
    serde_json::to_string(&item.content)
        .map_err(|e| sqlx::Error::Decode(format!("content for '{}' is not serializable: {e}", item.name).into()))
}

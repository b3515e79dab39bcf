use log::trace;
use sqlx::{FromRow, QueryBuilder, Row, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderStatus},
    traits::{LedgerError, OrderHistoryEntry, OrderQueryFilter, PendingDelivery},
};

/// Inserts a new order. This is not atomic on its own. Purchase authorization embeds this call
/// inside a transaction together with the balance debit, passing `&mut *tx` as the connection.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (player_id, item_id, quantity, total_price)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order.player_id)
    .bind(order.item_id)
    .bind(order.quantity)
    .bind(order.total_price)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(external_id) = query.external_id {
        where_clause.push("player_id IN (SELECT id FROM players WHERE external_id = ");
        where_clause.push_bind_unseparated(external_id);
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("Result of search_orders: {} rows", orders.len());
    Ok(orders)
}

/// Fetches up to `limit` `Pending` orders, oldest first, joined with the player and item context
/// the dispatcher needs to render the delivery sequence.
pub async fn fetch_pending_deliveries(
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PendingDelivery>, LedgerError> {
    let rows = sqlx::query(
        r#"
            SELECT
                orders.id as id,
                orders.player_id as player_id,
                orders.item_id as item_id,
                orders.quantity as quantity,
                orders.total_price as total_price,
                orders.status as status,
                orders.reason as reason,
                orders.created_at as created_at,
                orders.updated_at as updated_at,
                players.ingame_name as ingame_name,
                players.external_id as external_id,
                shop_items.name as item_name,
                shop_items.content as content
            FROM orders
            JOIN players ON orders.player_id = players.id
            JOIN shop_items ON orders.item_id = shop_items.id
            WHERE orders.status = 'Pending'
            ORDER BY orders.created_at ASC
            LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    rows.into_iter()
        .map(|row| {
            let order = Order::from_row(&row)?;
            let content: String = row.try_get("content")?;
            let content = serde_json::from_str(&content)?;
            Ok(PendingDelivery {
                order,
                ingame_name: row.try_get("ingame_name")?,
                external_id: row.try_get("external_id")?,
                item_name: row.try_get("item_name")?,
                content,
            })
        })
        .collect()
}

/// Transitions an order, enforcing the state machine: `Pending` is the only state that can move.
///
/// The status guard lives in the UPDATE's WHERE clause, so two processes racing to finish the
/// same order cannot both win. The loser gets [`LedgerError::InvalidStatusChange`].
pub async fn update_status_guarded(
    id: i64,
    status: OrderStatus,
    reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Order, LedgerError> {
    let updated: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, reason = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3 AND status = \
         'Pending' RETURNING *",
    )
    .bind(status.to_string())
    .bind(reason)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(order) => Ok(order),
        None => {
            let current = fetch_order(id, conn).await?.ok_or(LedgerError::OrderNotFound(id))?;
            Err(LedgerError::InvalidStatusChange { from: current.status, to: status })
        },
    }
}

/// The player's most recent purchases, newest first.
pub async fn order_history(
    external_id: &str,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderHistoryEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
            SELECT
                orders.id as order_id,
                shop_items.name as item_name,
                shop_items.category as category,
                orders.quantity as quantity,
                orders.total_price as total_price,
                orders.status as status,
                orders.created_at as created_at
            FROM orders
            JOIN players ON orders.player_id = players.id
            JOIN shop_items ON orders.item_id = shop_items.id
            WHERE players.external_id = $1
            ORDER BY orders.created_at DESC
            LIMIT $2
        "#,
    )
    .bind(external_id)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    rows.into_iter()
        .map(|row| {
            Ok(OrderHistoryEntry {
                order_id: row.try_get("order_id")?,
                item_name: row.try_get("item_name")?,
                category: row.try_get("category")?,
                quantity: row.try_get("quantity")?,
                total_price: row.try_get("total_price")?,
                status: row.try_get::<String, _>("status")?.into(),
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

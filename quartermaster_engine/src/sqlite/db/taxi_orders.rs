use sqlx::{FromRow, Row, SqliteConnection};

use crate::{
    db_types::{NewTaxiOrder, OrderStatus, TaxiOrder},
    traits::{LedgerError, PendingTaxiDelivery},
};

/// Inserts a new taxi order. Embedded inside the authorization transaction alongside the balance
/// debit.
pub async fn insert_taxi_order(order: NewTaxiOrder, conn: &mut SqliteConnection) -> Result<TaxiOrder, LedgerError> {
    let chosen = order.chosen_coordinate.as_ref().map(serde_json::to_string).transpose()?;
    let order = sqlx::query_as(
        r#"
            INSERT INTO taxi_orders (player_id, taxi_id, chosen_coordinate)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order.player_id)
    .bind(order.taxi_id)
    .bind(chosen)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_taxi_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<TaxiOrder>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM taxi_orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Fetches up to `limit` `Pending` taxi orders, oldest first, with the player and taxi context
/// the dispatcher needs.
pub async fn fetch_pending_taxi_deliveries(
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PendingTaxiDelivery>, LedgerError> {
    let rows = sqlx::query(
        r#"
            SELECT
                taxi_orders.id as id,
                taxi_orders.player_id as player_id,
                taxi_orders.taxi_id as taxi_id,
                taxi_orders.chosen_coordinate as chosen_coordinate,
                taxi_orders.status as status,
                taxi_orders.reason as reason,
                taxi_orders.created_at as created_at,
                taxi_orders.completed_at as completed_at,
                players.ingame_name as ingame_name,
                players.external_id as external_id,
                taxis.name as taxi_name,
                taxis.coordinates as coordinates
            FROM taxi_orders
            JOIN players ON taxi_orders.player_id = players.id
            JOIN taxis ON taxi_orders.taxi_id = taxis.id
            WHERE taxi_orders.status = 'Pending'
            ORDER BY taxi_orders.created_at ASC
            LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    rows.into_iter()
        .map(|row| {
            let order = TaxiOrder::from_row(&row)?;
            let coordinates: String = row.try_get("coordinates")?;
            let coordinates = serde_json::from_str(&coordinates)?;
            Ok(PendingTaxiDelivery {
                order,
                ingame_name: row.try_get("ingame_name")?,
                external_id: row.try_get("external_id")?,
                taxi_name: row.try_get("taxi_name")?,
                coordinates,
            })
        })
        .collect()
}

/// Transitions a taxi order out of `Pending`, stamping `completed_at` on delivery. The same
/// WHERE-clause guard as for shop orders applies.
pub async fn update_status_guarded(
    id: i64,
    status: OrderStatus,
    reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<TaxiOrder, LedgerError> {
    let completed = matches!(status, OrderStatus::Delivered);
    let updated: Option<TaxiOrder> = sqlx::query_as(
        "UPDATE taxi_orders SET status = $1, reason = $2, completed_at = CASE WHEN $3 THEN CURRENT_TIMESTAMP ELSE \
         completed_at END WHERE id = $4 AND status = 'Pending' RETURNING *",
    )
    .bind(status.to_string())
    .bind(reason)
    .bind(completed)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(order) => Ok(order),
        None => {
            let current = fetch_taxi_order(id, conn).await?.ok_or(LedgerError::OrderNotFound(id))?;
            Err(LedgerError::InvalidStatusChange { from: current.status, to: status })
        },
    }
}

use log::trace;
use qm_common::Coins;
use sqlx::SqliteConnection;

use crate::db_types::{NewPlayer, Player};

/// Inserts the player, or refreshes their names if the `external_id` is already registered.
/// Empty names in the request never clobber stored ones.
pub async fn upsert_player(player: NewPlayer, conn: &mut SqliteConnection) -> Result<Player, sqlx::Error> {
    let player = sqlx::query_as(
        r#"
            INSERT INTO players (external_id, ingame_name, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (external_id) DO UPDATE SET
                ingame_name = CASE WHEN excluded.ingame_name <> '' THEN excluded.ingame_name ELSE ingame_name END,
                display_name = CASE WHEN excluded.display_name <> '' THEN excluded.display_name ELSE display_name END,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(player.external_id)
    .bind(player.ingame_name)
    .bind(player.display_name)
    .fetch_one(conn)
    .await?;
    Ok(player)
}

pub async fn fetch_player_by_external_id(
    external_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM players WHERE external_id = $1").bind(external_id).fetch_optional(conn).await
}

pub async fn fetch_player_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM players WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_all_players(conn: &mut SqliteConnection) -> Result<Vec<Player>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM players ORDER BY created_at ASC").fetch_all(conn).await
}

/// Administrative override of a player's in-game name and balance.
pub async fn update_player(
    external_id: &str,
    ingame_name: &str,
    balance: Coins,
    conn: &mut SqliteConnection,
) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE players SET ingame_name = $1, balance = $2, updated_at = CURRENT_TIMESTAMP WHERE external_id = $3 \
         RETURNING *",
    )
    .bind(ingame_name)
    .bind(balance)
    .bind(external_id)
    .fetch_optional(conn)
    .await
}

/// Returns the number of rows removed (0 or 1). Orders cascade.
pub async fn delete_player(external_id: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM players WHERE external_id = $1").bind(external_id).execute(conn).await?;
    Ok(res.rows_affected())
}

/// Debits `amount` from the player's balance only if the balance covers it.
///
/// The conditional `WHERE balance >= amount` is what makes concurrent spends safe: two
/// authorizations racing on the same row serialise on the write and the second one sees the
/// reduced balance. Returns `None` when the funds were insufficient (nothing was changed).
pub async fn debit_if_sufficient(
    player_id: i64,
    amount: Coins,
    conn: &mut SqliteConnection,
) -> Result<Option<Player>, sqlx::Error> {
    let updated: Option<Player> = sqlx::query_as(
        "UPDATE players SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND balance >= $1 \
         RETURNING *",
    )
    .bind(amount)
    .bind(player_id)
    .fetch_optional(conn)
    .await?;
    trace!("🧑️ Debit of {amount} against player {player_id}: {}", if updated.is_some() { "ok" } else { "refused" });
    Ok(updated)
}

pub async fn credit(player_id: i64, amount: Coins, conn: &mut SqliteConnection) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE players SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(amount)
    .bind(player_id)
    .fetch_optional(conn)
    .await
}

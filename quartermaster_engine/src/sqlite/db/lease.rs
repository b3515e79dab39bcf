//! The dispatcher lease.
//!
//! The game console is a singleton resource, so only one dispatcher may run at a time. The lease
//! is a single row holding the instance id and an expiry. A healthy dispatcher refreshes the
//! lease every poll cycle; a crashed one simply lets it lapse, and the next instance takes over
//! once the expiry passes.
//!
//! Every transition is a single guarded write judged by `rows_affected`, so two instances racing
//! for the lease can never both win.

use chrono::{Duration, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::traits::LedgerError;

pub async fn acquire(instance_id: &str, ttl: Duration, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let now = Utc::now();
    let res = sqlx::query(
        r#"
            INSERT INTO dispatcher_lease (id, holder, expires_at) VALUES (1, $1, $2)
            ON CONFLICT (id) DO UPDATE SET
                holder = excluded.holder,
                expires_at = excluded.expires_at,
                updated_at = CURRENT_TIMESTAMP
            WHERE dispatcher_lease.holder = excluded.holder OR dispatcher_lease.expires_at <= $3
        "#,
    )
    .bind(instance_id)
    .bind(now + ttl)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    if res.rows_affected() == 0 {
        let holder = fetch_holder(conn).await?.unwrap_or_else(|| "unknown".to_string());
        return Err(LedgerError::LeaseHeld(holder));
    }
    debug!("🚚️ Dispatcher lease acquired by {instance_id}");
    Ok(())
}

pub async fn renew(instance_id: &str, ttl: Duration, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let res = sqlx::query(
        "UPDATE dispatcher_lease SET expires_at = $1, updated_at = CURRENT_TIMESTAMP WHERE id = 1 AND holder = $2",
    )
    .bind(Utc::now() + ttl)
    .bind(instance_id)
    .execute(&mut *conn)
    .await?;
    if res.rows_affected() == 0 {
        let holder = fetch_holder(conn).await?.unwrap_or_else(|| "nobody (lease row is missing)".to_string());
        return Err(LedgerError::LeaseHeld(holder));
    }
    Ok(())
}

pub async fn release(instance_id: &str, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let res = sqlx::query("DELETE FROM dispatcher_lease WHERE id = 1 AND holder = $1")
        .bind(instance_id)
        .execute(conn)
        .await?;
    if res.rows_affected() > 0 {
        debug!("🚚️ Dispatcher lease released by {instance_id}");
    }
    Ok(())
}

async fn fetch_holder(conn: &mut SqliteConnection) -> Result<Option<String>, LedgerError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT holder FROM dispatcher_lease WHERE id = 1").fetch_optional(conn).await?;
    Ok(row.map(|(holder,)| holder))
}

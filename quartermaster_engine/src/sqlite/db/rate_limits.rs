use chrono::{DateTime, Duration, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::traits::LedgerError;

/// Records an attempt against the persisted cooldown for `actor_id`.
///
/// Returns `Ok(())` and starts a fresh window if the actor was outside their cooldown, or
/// [`LedgerError::RateLimited`] with the seconds remaining if a live window exists. The window is
/// a row in `rate_limits`, so it survives restarts and is shared by every process on the same
/// database. The check and the refresh are one guarded UPSERT judged by `rows_affected`, so
/// simultaneous attempts from one actor cannot both start a window.
pub async fn try_acquire(actor_id: &str, window: Duration, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let now = Utc::now();
    let res = sqlx::query(
        "INSERT INTO rate_limits (actor_id, expires_at) VALUES ($1, $2) ON CONFLICT (actor_id) DO UPDATE SET \
         expires_at = excluded.expires_at WHERE rate_limits.expires_at <= $3",
    )
    .bind(actor_id)
    .bind(now + window)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    if res.rows_affected() == 0 {
        let existing: Option<(DateTime<Utc>,)> =
            sqlx::query_as("SELECT expires_at FROM rate_limits WHERE actor_id = $1")
                .bind(actor_id)
                .fetch_optional(conn)
                .await?;
        let remaining = existing.map(|(expires_at,)| (expires_at - now).num_seconds().max(1)).unwrap_or(1);
        trace!("🗃️ Rate limit refused for {actor_id}: {remaining}s remaining");
        return Err(LedgerError::RateLimited(remaining));
    }
    Ok(())
}

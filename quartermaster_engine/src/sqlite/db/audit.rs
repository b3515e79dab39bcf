use sqlx::SqliteConnection;

use crate::db_types::AuditEntry;

pub async fn insert_audit(
    admin_id: &str,
    action: &str,
    details: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO audit_logs (admin_id, action, details) VALUES ($1, $2, $3)")
        .bind(admin_id)
        .bind(action)
        .bind(details)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn recent_audit(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<AuditEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM audit_logs ORDER BY created_at DESC, id DESC LIMIT $1")
        .bind(limit)
        .fetch_all(conn)
        .await
}

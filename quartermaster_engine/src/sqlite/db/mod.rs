//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod audit;
pub mod lease;
pub mod orders;
pub mod players;
pub mod rate_limits;
mod rows;
pub mod shop_items;
pub mod taxi_orders;
pub mod taxis;

const SQLITE_DB_URL: &str = "sqlite://data/quartermaster.db";

pub fn db_url() -> String {
    let result = env::var("QM_DATABASE_URL").unwrap_or_else(|_| {
        info!("QM_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Cascading deletes depend on this; sqlite has it off by default.
                sqlx::query("PRAGMA foreign_keys = ON").execute(conn).await?;
                Ok(())
            })
        })
        .connect(url)
        .await?;
    Ok(pool)
}

/// Brings the schema up to date. Safe to call on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqlxError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("🗃️ Database migrations are up to date.");
    Ok(())
}

use sqlx::SqliteConnection;

use crate::db_types::{NewTaxi, Taxi};

pub async fn insert_taxi(taxi: NewTaxi, conn: &mut SqliteConnection) -> Result<Taxi, sqlx::Error> {
    let coordinates = serialize_coordinates(&taxi)?;
    let taxi = sqlx::query_as(
        r#"
            INSERT INTO taxis (name, price, coordinates)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(taxi.name)
    .bind(taxi.price)
    .bind(coordinates)
    .fetch_one(conn)
    .await?;
    Ok(taxi)
}

pub async fn update_taxi(taxi_id: i64, taxi: NewTaxi, conn: &mut SqliteConnection) -> Result<Option<Taxi>, sqlx::Error> {
    let coordinates = serialize_coordinates(&taxi)?;
    sqlx::query_as(
        "UPDATE taxis SET name = $1, price = $2, coordinates = $3, updated_at = CURRENT_TIMESTAMP WHERE id = $4 \
         RETURNING *",
    )
    .bind(taxi.name)
    .bind(taxi.price)
    .bind(coordinates)
    .bind(taxi_id)
    .fetch_optional(conn)
    .await
}

pub async fn delete_taxi(taxi_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM taxis WHERE id = $1").bind(taxi_id).execute(conn).await?;
    Ok(res.rows_affected())
}

pub async fn fetch_taxi(taxi_id: i64, conn: &mut SqliteConnection) -> Result<Option<Taxi>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM taxis WHERE id = $1").bind(taxi_id).fetch_optional(conn).await
}

pub async fn fetch_all_taxis(conn: &mut SqliteConnection) -> Result<Vec<Taxi>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM taxis ORDER BY name ASC").fetch_all(conn).await
}

fn serialize_coordinates(taxi: &NewTaxi) -> Result<String, sqlx::Error> {
    serde_json::to_string(&taxi.coordinates)
        .map_err(|e| sqlx::Error::Decode(format!("coordinates for '{}' are not serializable: {e}", taxi.name).into()))
}

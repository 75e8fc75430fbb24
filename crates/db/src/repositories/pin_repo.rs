//! Repository for the `pins` table.

use sqlx::SqlitePool;
use waypoint_core::types::{Coordinate, DbId};

use crate::models::pin::{CreatePin, Pin};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, latitude, longitude, page, original_photo_count, created_at";

/// Provides CRUD operations for pins.
pub struct PinRepo;

impl PinRepo {
    /// Insert a new pin, returning the created row.
    ///
    /// If `page` is `None` in the input, the cursor starts at 1.
    pub async fn create(pool: &SqlitePool, input: &CreatePin) -> Result<Pin, sqlx::Error> {
        let query = format!(
            "INSERT INTO pins (latitude, longitude, page)
             VALUES (?, ?, COALESCE(?, 1))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Pin>(&query)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.page)
            .fetch_one(pool)
            .await
    }

    /// Find a pin by its internal ID.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Pin>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pins WHERE id = ?");
        sqlx::query_as::<_, Pin>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a pin by its exact coordinate pair (the natural key).
    pub async fn find_by_coordinate(
        pool: &SqlitePool,
        coordinate: Coordinate,
    ) -> Result<Option<Pin>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pins WHERE latitude = ? AND longitude = ?");
        sqlx::query_as::<_, Pin>(&query)
            .bind(coordinate.latitude)
            .bind(coordinate.longitude)
            .fetch_optional(pool)
            .await
    }

    /// List all pins in creation order.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Pin>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pins ORDER BY created_at ASC, id ASC");
        sqlx::query_as::<_, Pin>(&query).fetch_all(pool).await
    }

    /// Store the pagination cursor. Returns `false` if the pin is gone.
    pub async fn set_page(pool: &SqlitePool, id: DbId, page: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE pins SET page = ? WHERE id = ?")
            .bind(page)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store the photo count of the most recent search.
    pub async fn set_original_photo_count(
        pool: &SqlitePool,
        id: DbId,
        count: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE pins SET original_photo_count = ? WHERE id = ?")
            .bind(count)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a pin to a new coordinate pair.
    pub async fn set_coordinate(
        pool: &SqlitePool,
        id: DbId,
        coordinate: Coordinate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE pins SET latitude = ?, longitude = ? WHERE id = ?")
            .bind(coordinate.latitude)
            .bind(coordinate.longitude)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a pin by ID. Returns `true` if a row was removed.
    ///
    /// Callers are expected to have removed the pin's photos first; this
    /// deletes only the pin row itself.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pins WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

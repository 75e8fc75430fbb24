//! Repository for the `photos` table.

use sqlx::SqlitePool;
use waypoint_core::types::DbId;

use crate::models::photo::{CreatePhoto, Photo};

/// Column list shared across SELECT queries.
const COLUMNS: &str = "\
    id, pin_id, flickr_id, owner, secret, server, farm, title, \
    image_key, image_loaded, created_at";

/// Column list for INSERT (excludes auto-generated `id`, `image_loaded`,
/// and `created_at`).
const INSERT_COLUMNS: &str = "pin_id, flickr_id, owner, secret, server, farm, title, image_key";

/// Provides query and mutation operations for photos.
pub struct PhotoRepo;

impl PhotoRepo {
    /// Bulk-insert one photo row per search descriptor, bound to `pin_id`,
    /// all with `image_loaded = false`.
    ///
    /// Uses a single INSERT with multiple value rows so readers never
    /// observe a partial placeholder count for the collection.
    pub async fn create_batch(
        pool: &SqlitePool,
        pin_id: DbId,
        inputs: &[CreatePhoto],
    ) -> Result<Vec<Photo>, sqlx::Error> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("INSERT INTO photos ({INSERT_COLUMNS}) VALUES ");
        let mut first = true;
        for _ in inputs {
            if !first {
                query.push_str(", ");
            }
            first = false;
            query.push_str("(?, ?, ?, ?, ?, ?, ?, ?)");
        }
        query.push_str(&format!(" RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, Photo>(&query);
        for input in inputs {
            q = q
                .bind(pin_id)
                .bind(&input.flickr_id)
                .bind(&input.owner)
                .bind(&input.secret)
                .bind(&input.server)
                .bind(input.farm)
                .bind(&input.title)
                .bind(&input.image_key);
        }

        q.fetch_all(pool).await
    }

    /// Find a photo by its internal ID.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Photo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photos WHERE id = ?");
        sqlx::query_as::<_, Photo>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a pin's photos in creation order (the album grid's sort).
    pub async fn list_for_pin(pool: &SqlitePool, pin_id: DbId) -> Result<Vec<Photo>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM photos WHERE pin_id = ? ORDER BY created_at ASC, id ASC");
        sqlx::query_as::<_, Photo>(&query)
            .bind(pin_id)
            .fetch_all(pool)
            .await
    }

    /// Count of the pin's photos.
    pub async fn count_for_pin(pool: &SqlitePool, pin_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photos WHERE pin_id = ?")
            .bind(pin_id)
            .fetch_one(pool)
            .await
    }

    /// Count of the pin's photos still waiting for image bytes.
    pub async fn count_unloaded(pool: &SqlitePool, pin_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM photos WHERE pin_id = ? AND image_loaded = 0",
        )
        .bind(pin_id)
        .fetch_one(pool)
        .await
    }

    /// Mark a photo's image as durably cached.
    ///
    /// Guarded by the owning pin: returns `false` when the photo no longer
    /// belongs to `pin_id` (deleted or detached while the download was in
    /// flight), so stale completions cannot mutate reassigned state.
    pub async fn mark_image_loaded(
        pool: &SqlitePool,
        photo_id: DbId,
        pin_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE photos SET image_loaded = 1
             WHERE id = ? AND pin_id = ? AND image_loaded = 0",
        )
        .bind(photo_id)
        .bind(pin_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Detach a photo from its pin ahead of deletion.
    pub async fn detach(pool: &SqlitePool, photo_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE photos SET pin_id = NULL WHERE id = ?")
            .bind(photo_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a photo row by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, photo_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(photo_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

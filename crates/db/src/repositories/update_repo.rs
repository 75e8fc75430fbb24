//! Repository for the `updates` audit table.

use sqlx::SqlitePool;

use crate::models::update::{CreateUpdate, UpdateKind, UpdateRecord};

/// Column list shared across queries.
const COLUMNS: &str = "id, kind, description, number_of_items, latitude, longitude, created_at";

/// Provides insert and query operations for the history log.
///
/// Rows are immutable once created; there are no update or delete methods.
pub struct UpdateRepo;

impl UpdateRepo {
    /// Record one audit row for a completed bulk operation.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateUpdate,
    ) -> Result<UpdateRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO updates (kind, description, number_of_items, latitude, longitude)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UpdateRecord>(&query)
            .bind(input.kind)
            .bind(&input.description)
            .bind(input.number_of_items)
            .bind(input.latitude)
            .bind(input.longitude)
            .fetch_one(pool)
            .await
    }

    /// History feed: every update, most recent first.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<UpdateRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM updates ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, UpdateRecord>(&query)
            .fetch_all(pool)
            .await
    }

    /// Count updates of one kind.
    pub async fn count_by_kind(pool: &SqlitePool, kind: UpdateKind) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM updates WHERE kind = ?")
            .bind(kind)
            .fetch_one(pool)
            .await
    }
}

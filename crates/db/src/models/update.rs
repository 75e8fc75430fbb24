//! Update (audit) entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use waypoint_core::types::{DbId, Timestamp};

/// Category of a completed bulk operation recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum UpdateKind {
    /// Photo rows were created in bulk after a search resolved.
    PhotoCreation,
    /// Every image in a pin's collection finished downloading.
    ImageCreation,
    /// Cached images and their rows were removed in bulk.
    ImageDeletion,
}

/// A row from the `updates` table. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UpdateRecord {
    pub id: DbId,
    pub kind: UpdateKind,
    pub description: String,
    pub number_of_items: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: Timestamp,
}

/// DTO for recording a new update.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUpdate {
    pub kind: UpdateKind,
    pub description: String,
    pub number_of_items: i64,
    pub latitude: f64,
    pub longitude: f64,
}

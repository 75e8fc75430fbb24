//! Photo entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use waypoint_core::types::{DbId, Timestamp};

/// A row from the `photos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: DbId,
    /// Owning pin. `None` only during teardown: the photo is detached
    /// before its row is deleted.
    pub pin_id: Option<DbId>,
    /// Provider-assigned photo id.
    pub flickr_id: String,
    pub owner: String,
    pub secret: String,
    pub server: String,
    pub farm: i64,
    pub title: String,
    /// Content-addressed cache key for the downloaded bytes.
    pub image_key: String,
    /// Flips to true exactly once, when the image bytes are durably cached.
    pub image_loaded: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a photo from one search result descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhoto {
    pub flickr_id: String,
    pub owner: String,
    pub secret: String,
    pub server: String,
    pub farm: i64,
    pub title: String,
    pub image_key: String,
}

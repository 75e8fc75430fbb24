//! Pin entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use waypoint_core::types::{Coordinate, DbId, Timestamp};

/// A row from the `pins` table.
///
/// The (latitude, longitude) pair is the natural key: no two pins share
/// exact coordinates.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Pin {
    pub id: DbId,
    pub latitude: f64,
    pub longitude: f64,
    /// Pagination cursor for the photo search, starting at 1.
    pub page: i64,
    /// Photo count returned by the most recent search. A full page means
    /// the provider may have more, so a refresh advances the cursor; a
    /// short page resets it.
    pub original_photo_count: i64,
    pub created_at: Timestamp,
}

impl Pin {
    /// The pin's coordinate pair.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// DTO for creating a new pin.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePin {
    pub latitude: f64,
    pub longitude: f64,
    /// Initial page cursor; defaults to 1 when `None`.
    pub page: Option<i64>,
}

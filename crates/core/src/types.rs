//! Primitive type aliases and small shared value types.

use serde::{Deserialize, Serialize};

/// All database primary keys are 64-bit SQLite rowids.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A geographic coordinate pair.
///
/// Pins treat the exact (latitude, longitude) pair as a natural key: no two
/// pins share the same coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Fetch lifecycle state of a single pin's photo collection.
///
/// A pin with no registered fetch is `Idle`. `Searching` covers the initial
/// paginated search request; `Downloading` covers the per-photo fan-out;
/// `Settled` means every photo of the collection has its image cached (or
/// the search returned nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    Idle,
    Searching,
    Downloading,
    Settled,
}

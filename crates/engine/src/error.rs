//! Engine error taxonomy.

use waypoint_core::error::CoreError;
use waypoint_core::types::DbId;
use waypoint_flickr::SearchError;

/// Errors surfaced by [`SyncEngine`](crate::SyncEngine) operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The pin already has an active search or download collection.
    #[error("pin {0} already has a fetch in flight")]
    AlreadyInFlight(DbId),

    /// The pin row does not exist.
    #[error("pin {0} not found")]
    PinNotFound(DbId),

    /// A domain-level validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The photo search failed; no entities were created.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// A repository operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

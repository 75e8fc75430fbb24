//! The pin/photo synchronization engine.
//!
//! [`SyncEngine`] drives the full collection lifecycle for a pin: one
//! paginated search, a bulk placeholder insert, a concurrent per-photo
//! download fan-out, race-safe completion tracking, and the audit trail.
//! Its collaborators — search, image fetch, byte cache, persistence pool,
//! and change feed — are injected at construction rather than looked up
//! through globals.

pub mod engine;
pub mod error;
pub mod provider;

pub use engine::{FetchOutcome, SyncEngine};
pub use error::EngineError;
pub use provider::{ImageFetcher, PhotoSearch};

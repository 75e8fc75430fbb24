//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&SqlitePool` as the first argument.

pub mod photo_repo;
pub mod pin_repo;
pub mod update_repo;

pub use photo_repo::PhotoRepo;
pub use pin_repo::PinRepo;
pub use update_repo::UpdateRepo;

//! Row structs and create DTOs for the waypoint entities.

pub mod photo;
pub mod pin;
pub mod update;

//! Cache key derivation for downloaded photo images.

use crate::types::Timestamp;

/// Derive the content-addressed cache key for a photo's image bytes.
///
/// The key is a pure function of the photo's creation time, provider id,
/// and secret, so re-creating a photo after a refresh never collides with
/// a previous incarnation's cached bytes.
pub fn derive_image_key(created_at: Timestamp, photo_id: &str, secret: &str) -> String {
    format!(
        "{}_{}_{}_q.jpg",
        created_at.format("%Y%m%d%H%M%S%.3f"),
        photo_id,
        secret
    )
}

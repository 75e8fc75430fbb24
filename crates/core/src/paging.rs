//! Pagination policy for photo search requests.
//!
//! Pure functions and constants shared by the search client and the engine's
//! refresh logic.

use crate::error::CoreError;

/// Photos requested per search page.
///
/// 21 tiles evenly into the 3-column album grid. Any change to this value
/// must keep it a multiple of [`GRID_COLUMNS`].
pub const PER_PAGE: i64 = 21;

/// Column count of the album grid the page size tiles into.
pub const GRID_COLUMNS: i64 = 3;

/// First valid page number.
pub const FIRST_PAGE: i64 = 1;

/// Compute the page a refresh should request.
///
/// A full page on the last search signals the provider may have more
/// results, so the cursor advances. A short page means the provider is
/// exhausted and the cursor resets to the first page.
pub fn next_page(current_page: i64, original_photo_count: i64) -> i64 {
    if original_photo_count == PER_PAGE {
        current_page + 1
    } else {
        FIRST_PAGE
    }
}

/// Validate a page cursor.
pub fn validate_page(page: i64) -> Result<(), CoreError> {
    if page < FIRST_PAGE {
        return Err(CoreError::Validation(format!(
            "Page cursor must be >= {FIRST_PAGE}, got {page}"
        )));
    }
    Ok(())
}

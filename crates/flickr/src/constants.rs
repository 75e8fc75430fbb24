//! Flickr API contract constants.

/// Base URL of the REST endpoint.
pub const REST_URL: &str = "https://api.flickr.com/services/rest/";

/// Host serving image files, prefixed with a per-farm subdomain.
pub const IMAGE_HOST: &str = "staticflickr.com";

/// Search method name.
pub const METHOD_PHOTO_SEARCH: &str = "flickr.photos.search";

/// Response format: plain JSON, no JSONP wrapper.
pub const FORMAT: &str = "json";
pub const NO_JSON_CALLBACK: &str = "1";

/// Public photos only.
pub const PRIVACY_FILTER: &str = "1";

/// Street-level accuracy for coordinate searches.
pub const ACCURACY: &str = "16";

// ---------------------------------------------------------------------------
// Provider failure codes
// ---------------------------------------------------------------------------

/// Search is throttled or temporarily switched off.
pub const STAT_SEARCH_UNAVAILABLE: i64 = 10;
/// The request arguments were rejected.
pub const STAT_ILLOGICAL_ARGS: i64 = 18;
/// Service currently unavailable.
pub const STAT_SERVICE_UNAVAILABLE: i64 = 105;
/// Bad URL found.
pub const STAT_BAD_URL: i64 = 116;

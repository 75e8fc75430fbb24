//! Flickr client configuration loaded from environment variables.

/// Configuration for [`FlickrClient`](crate::FlickrClient).
#[derive(Debug, Clone)]
pub struct FlickrConfig {
    /// API credential sent with every search request.
    pub api_key: String,
    /// Per-request deadline in seconds; bounds worst-case hung transfers.
    pub request_timeout_secs: u64,
}

/// Default per-request deadline.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl FlickrConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `FLICKR_API_KEY`              | (empty) |
    /// | `FLICKR_REQUEST_TIMEOUT_SECS` | `30`    |
    pub fn from_env() -> Self {
        let api_key = std::env::var("FLICKR_API_KEY").unwrap_or_default();

        let request_timeout_secs: u64 = std::env::var("FLICKR_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("FLICKR_REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            request_timeout_secs,
        }
    }

    /// Configuration with an explicit key, for embedding without env vars.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

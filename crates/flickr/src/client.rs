//! HTTP client for the search endpoint and static image hosts.
//!
//! Uses [`reqwest`] with a per-request deadline from [`FlickrConfig`].

use std::time::Duration;

use serde::Deserialize;
use waypoint_core::paging::PER_PAGE;
use waypoint_core::types::Coordinate;

use crate::config::FlickrConfig;
use crate::constants::{
    ACCURACY, FORMAT, METHOD_PHOTO_SEARCH, NO_JSON_CALLBACK, PRIVACY_FILTER, REST_URL,
    STAT_BAD_URL, STAT_ILLOGICAL_ARGS, STAT_SEARCH_UNAVAILABLE, STAT_SERVICE_UNAVAILABLE,
};

// ---------------------------------------------------------------------------
// PhotoDescriptor
// ---------------------------------------------------------------------------

/// One photo record from a search response: everything needed to
/// reconstruct a download URL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoDescriptor {
    pub id: String,
    pub owner: String,
    pub secret: String,
    pub server: String,
    pub farm: i64,
    #[serde(default)]
    pub title: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the search endpoint.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code, or the provider
    /// reported a failure code outside the known set.
    #[error("search returned HTTP {0}")]
    Http(u16),

    /// The response body did not contain the expected `photos.photo` shape.
    #[error("malformed search response: {0}")]
    MalformedResponse(String),

    /// The provider rejected or throttled the request (codes 10, 18).
    #[error("search rejected by provider: {0}")]
    RateLimited(String),

    /// The provider reported itself unavailable (codes 105, 116).
    #[error("search service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Errors from image downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("image request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The image host returned a non-2xx status code.
    #[error("image host returned HTTP {0}")]
    Http(u16),

    /// A 2xx response carrying an empty body.
    #[error("image response carried no data")]
    NoData,
}

// ---------------------------------------------------------------------------
// FlickrClient
// ---------------------------------------------------------------------------

/// Client for the REST API and the static image hosts.
pub struct FlickrClient {
    client: reqwest::Client,
    config: FlickrConfig,
}

impl FlickrClient {
    /// Create a client with its own connection pool.
    pub fn new(config: FlickrConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful for
    /// connection pooling across components).
    pub fn with_client(client: reqwest::Client, config: FlickrConfig) -> Self {
        Self { client, config }
    }

    /// Search for photos around `coordinate`, one page at a time.
    ///
    /// An empty descriptor list is a successful result: the provider found
    /// nothing near the coordinate.
    pub async fn search(
        &self,
        coordinate: Coordinate,
        page: i64,
    ) -> Result<Vec<PhotoDescriptor>, SearchError> {
        tracing::debug!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            page,
            "Searching for photos",
        );

        let per_page = PER_PAGE.to_string();
        let page = page.to_string();
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();

        let response = self
            .client
            .get(REST_URL)
            .timeout(self.timeout())
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("format", FORMAT),
                ("nojsoncallback", NO_JSON_CALLBACK),
                ("method", METHOD_PHOTO_SEARCH),
                ("privacy_filter", PRIVACY_FILTER),
                ("accuracy", ACCURACY),
                ("per_page", per_page.as_str()),
                ("page", page.as_str()),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::MalformedResponse(e.to_string()))?;

        parse_search_body(&body)
    }

    /// Download raw image bytes from a static host URL.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.client.get(url).timeout(self.timeout()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Http(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(DownloadError::NoData);
        }

        Ok(bytes.to_vec())
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Interpret a decoded search response body.
///
/// The provider reports failures as `stat: "fail"` with a numeric code
/// inside an HTTP 200 response, so that check runs before the
/// `photos.photo` extraction.
fn parse_search_body(body: &serde_json::Value) -> Result<Vec<PhotoDescriptor>, SearchError> {
    if body.get("stat").and_then(|s| s.as_str()) == Some("fail") {
        let code = body.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown provider failure")
            .to_string();

        return Err(match code {
            STAT_SEARCH_UNAVAILABLE | STAT_ILLOGICAL_ARGS => SearchError::RateLimited(message),
            STAT_SERVICE_UNAVAILABLE | STAT_BAD_URL => SearchError::ServiceUnavailable(message),
            other => SearchError::Http(other as u16),
        });
    }

    let photos = body
        .get("photos")
        .ok_or_else(|| SearchError::MalformedResponse("missing `photos` object".to_string()))?;

    let photo_array = photos
        .get("photo")
        .and_then(|p| p.as_array())
        .ok_or_else(|| SearchError::MalformedResponse("missing `photos.photo` array".to_string()))?;

    photo_array
        .iter()
        .map(|entry| {
            serde_json::from_value::<PhotoDescriptor>(entry.clone())
                .map_err(|e| SearchError::MalformedResponse(e.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Network ports consumed by the engine.
//!
//! [`FlickrClient`] implements both; tests substitute scripted stand-ins.

use async_trait::async_trait;
use waypoint_core::types::Coordinate;
use waypoint_flickr::{DownloadError, FlickrClient, PhotoDescriptor, SearchError};

/// Paginated photo search by coordinate.
#[async_trait]
pub trait PhotoSearch: Send + Sync {
    async fn search(
        &self,
        coordinate: Coordinate,
        page: i64,
    ) -> Result<Vec<PhotoDescriptor>, SearchError>;
}

/// Raw image download by URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

#[async_trait]
impl PhotoSearch for FlickrClient {
    async fn search(
        &self,
        coordinate: Coordinate,
        page: i64,
    ) -> Result<Vec<PhotoDescriptor>, SearchError> {
        FlickrClient::search(self, coordinate, page).await
    }
}

#[async_trait]
impl ImageFetcher for FlickrClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        self.fetch_image(url).await
    }
}

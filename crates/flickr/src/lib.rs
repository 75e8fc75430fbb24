//! Flickr photo-search API client.
//!
//! Wraps the two Flickr surfaces waypoint talks to:
//!
//! - the REST search endpoint ([`FlickrClient::search`]), which turns a
//!   coordinate and page number into [`PhotoDescriptor`] records, and
//! - the static image hosts ([`FlickrClient::fetch_image`]), which serve
//!   the actual JPEG bytes at the sizes enumerated in [`ImageSize`].

pub mod client;
pub mod config;
pub mod constants;
pub mod urls;

pub use client::{DownloadError, FlickrClient, PhotoDescriptor, SearchError};
pub use config::FlickrConfig;
pub use urls::{image_url, ImageSize};

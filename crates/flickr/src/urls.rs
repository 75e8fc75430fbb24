//! Image URL construction for the static photo hosts.

use crate::constants::IMAGE_HOST;

/// Image size variants offered by the static hosts.
///
/// Each maps to the token embedded in the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// 75x75 square crop.
    Square,
    /// 150x150 square crop. The album grid's thumbnail size.
    LargeSquare,
    /// 100 on the longest side.
    Thumbnail,
    /// 240 on the longest side.
    Small,
    /// 320 on the longest side.
    Small320,
    /// 500 on the longest side.
    Medium,
    /// 640 on the longest side.
    Medium640,
    /// 800 on the longest side.
    Medium800,
    /// 1024 on the longest side.
    Large,
    /// 1600 on the longest side.
    Large1600,
    /// 2048 on the longest side.
    Large2048,
    /// As uploaded.
    Original,
}

impl ImageSize {
    /// The URL token for this size.
    pub fn token(self) -> &'static str {
        match self {
            ImageSize::Square => "s",
            ImageSize::LargeSquare => "q",
            ImageSize::Thumbnail => "t",
            ImageSize::Small => "m",
            ImageSize::Small320 => "n",
            ImageSize::Medium => "-",
            ImageSize::Medium640 => "z",
            ImageSize::Medium800 => "c",
            ImageSize::Large => "b",
            ImageSize::Large1600 => "h",
            ImageSize::Large2048 => "k",
            ImageSize::Original => "o",
        }
    }
}

/// Build the download URL for one photo at the given size.
pub fn image_url(farm: i64, server: &str, photo_id: &str, secret: &str, size: ImageSize) -> String {
    format!(
        "https://farm{farm}.{IMAGE_HOST}/{server}/{photo_id}_{secret}_{}.jpg",
        size.token()
    )
}

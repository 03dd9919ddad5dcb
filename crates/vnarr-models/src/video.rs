//! Video job identity and catalog entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while validating a video job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoAssetError {
    #[error("Video key must not be empty")]
    EmptyKey,

    #[error("Video key contains an illegal path segment: {0}")]
    IllegalKey(String),

    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),
}

/// One video job.
///
/// `key` namespaces every derived artifact (frames directory, collage
/// directory, progress channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAsset {
    /// Where the source video bytes can be fetched from.
    pub source_url: String,
    /// Stable identifier for the video.
    pub key: String,
}

impl VideoAsset {
    /// Create a validated video asset.
    pub fn new(
        source_url: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, VideoAssetError> {
        let source_url = source_url.into();
        let key = key.into();

        validate_key(&key)?;
        Url::parse(&source_url).map_err(|e| VideoAssetError::InvalidUrl(e.to_string()))?;

        Ok(Self { source_url, key })
    }

    /// Key of the video as used in object paths.
    pub fn key(&self) -> &str {
        &self.key
    }
}

fn validate_key(key: &str) -> Result<(), VideoAssetError> {
    if key.trim().is_empty() {
        return Err(VideoAssetError::EmptyKey);
    }
    if key.split('/').any(|segment| segment == ".." || segment.is_empty()) || key.contains('\\') {
        return Err(VideoAssetError::IllegalKey(key.to_string()));
    }
    Ok(())
}

/// A video available in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListing {
    pub display_name: String,
    pub key: String,
    pub url_slug: String,
}

impl VideoListing {
    /// Build a listing from an object key. Only the first `.` is rewritten in the slug.
    pub fn from_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            display_name: key.clone(),
            url_slug: key.replacen('.', "_", 1),
            key,
        }
    }

    /// Whether an object key names a listable video.
    pub fn is_video_key(key: &str) -> bool {
        key.ends_with(".mp4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_asset_validation() {
        let asset = VideoAsset::new("https://example.com/cat.mp4", "cat.mp4").unwrap();
        assert_eq!(asset.key(), "cat.mp4");

        assert_eq!(
            VideoAsset::new("https://example.com/a.mp4", "  "),
            Err(VideoAssetError::EmptyKey)
        );
        assert!(matches!(
            VideoAsset::new("https://example.com/a.mp4", "../etc"),
            Err(VideoAssetError::IllegalKey(_))
        ));
        assert!(matches!(
            VideoAsset::new("not a url", "cat.mp4"),
            Err(VideoAssetError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_listing_slug_rewrites_first_dot_only() {
        let listing = VideoListing::from_key("clips/cat.v2.mp4");
        assert_eq!(listing.display_name, "clips/cat.v2.mp4");
        assert_eq!(listing.url_slug, "clips/cat_v2.mp4");
    }

    #[test]
    fn test_listing_serializes_camel_case() {
        let json = serde_json::to_value(VideoListing::from_key("cat.mp4")).unwrap();
        assert_eq!(json["displayName"], "cat.mp4");
        assert_eq!(json["urlSlug"], "cat_mp4");
    }

    #[test]
    fn test_is_video_key() {
        assert!(VideoListing::is_video_key("cat.mp4"));
        assert!(!VideoListing::is_video_key("collages/cat.mp4/collage-1.jpg"));
    }
}

//! Graph API response types.
//!
//! All types model the JSON structures returned by the ad platform's Graph
//! REST API. Creative payloads in the wild are wildly inconsistent — every
//! sub-structure is `#[serde(default)]` so an absent or null field reads as
//! "not present" instead of failing the whole deserialization.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Error envelope
// ---------------------------------------------------------------------------

/// Error envelope returned with non-2xx statuses: `{"error": {...}}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

/// The inner error object of a Graph API error envelope.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub error_subcode: Option<i64>,
}

// ---------------------------------------------------------------------------
// Ad creative
// ---------------------------------------------------------------------------

/// An ad creative object as returned by `GET /{creative_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCreative {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image_hash: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Present when the creative is driven by a product catalog.
    #[serde(default)]
    pub product_set_id: Option<String>,
    #[serde(default)]
    pub call_to_action_type: Option<String>,
    #[serde(default)]
    pub object_story_spec: Option<ObjectStorySpec>,
    #[serde(default)]
    pub asset_feed_spec: Option<AssetFeedSpec>,
}

/// The story spec describing how a creative renders: exactly one of the
/// `*_data` members is normally present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectStorySpec {
    #[serde(default)]
    pub link_data: Option<LinkData>,
    #[serde(default)]
    pub video_data: Option<VideoData>,
    #[serde(default)]
    pub photo_data: Option<PhotoData>,
    /// Catalog-driven template ads carry their link fields here instead of
    /// `link_data`.
    #[serde(default)]
    pub template_data: Option<LinkData>,
}

/// Link ad payload: single image or carousel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkData {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image_hash: Option<String>,
    /// Direct image URL; present on some creatives instead of a hash.
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub child_attachments: Vec<RawChildAttachment>,
    #[serde(default)]
    pub call_to_action: Option<serde_json::Value>,
}

/// One carousel slot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChildAttachment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image_hash: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<serde_json::Value>,
}

/// Video ad payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoData {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_hash: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<serde_json::Value>,
}

/// Photo ad payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoData {
    #[serde(default)]
    pub image_hash: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Dynamic asset-feed spec: lists of interchangeable assets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetFeedSpec {
    #[serde(default)]
    pub images: Vec<FeedImage>,
    #[serde(default)]
    pub videos: Vec<FeedVideo>,
    #[serde(default)]
    pub bodies: Vec<TextAsset>,
    #[serde(default)]
    pub titles: Vec<TextAsset>,
    #[serde(default)]
    pub descriptions: Vec<TextAsset>,
    #[serde(default)]
    pub link_urls: Vec<FeedLink>,
}

/// An image asset in a dynamic feed: hash, URL, or both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedImage {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A video asset in a dynamic feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedVideo {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// A text asset (body, title, description) in a dynamic feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextAsset {
    #[serde(default)]
    pub text: String,
}

/// A link asset in a dynamic feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedLink {
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Ad images (batched hash resolution)
// ---------------------------------------------------------------------------

/// Response from `GET /act_{account_id}/adimages?hashes=[...]`.
#[derive(Debug, Deserialize)]
pub struct AdImageList {
    #[serde(default)]
    pub data: Vec<AdImage>,
}

/// A resolved ad image. `permalink_url` never expires and is preferred over
/// the sized and default CDN URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct AdImage {
    pub hash: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_128: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
}

impl AdImage {
    /// Best available URL: permanent > higher-resolution > default.
    #[must_use]
    pub fn best_url(&self) -> Option<&str> {
        self.permalink_url
            .as_deref()
            .or(self.url_128.as_deref())
            .or(self.url.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

/// Response from `GET /{video_id}?fields=source,picture,length,thumbnails`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoDetail {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub thumbnails: Option<VideoThumbnailList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoThumbnailList {
    #[serde(default)]
    pub data: Vec<VideoThumbnail>,
}

/// One thumbnail variant of a video.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoThumbnail {
    pub uri: String,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub scale: Option<f64>,
}

// ---------------------------------------------------------------------------
// Previews
// ---------------------------------------------------------------------------

/// Response from `GET /{creative_id}/previews?ad_format=...`.
#[derive(Debug, Deserialize)]
pub struct PreviewList {
    #[serde(default)]
    pub data: Vec<Preview>,
}

/// An embeddable HTML preview fragment.
#[derive(Debug, Clone, Deserialize)]
pub struct Preview {
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_creative_tolerates_minimal_payload() {
        let creative: RawCreative =
            serde_json::from_value(serde_json::json!({ "id": "123" })).unwrap();
        assert_eq!(creative.id, "123");
        assert!(creative.object_story_spec.is_none());
        assert!(creative.asset_feed_spec.is_none());
    }

    #[test]
    fn raw_creative_parses_carousel_spec() {
        let creative: RawCreative = serde_json::from_value(serde_json::json!({
            "id": "123",
            "object_story_spec": {
                "link_data": {
                    "message": "hello",
                    "child_attachments": [
                        { "image_hash": "aaa", "link": "https://a.test" },
                        { "image_hash": "bbb", "link": "https://b.test" }
                    ]
                }
            }
        }))
        .unwrap();
        let link = creative
            .object_story_spec
            .unwrap()
            .link_data
            .unwrap();
        assert_eq!(link.child_attachments.len(), 2);
        assert_eq!(link.child_attachments[0].image_hash.as_deref(), Some("aaa"));
    }

    #[test]
    fn ad_image_best_url_prefers_permalink() {
        let image = AdImage {
            hash: "aaa".to_string(),
            url: Some("https://cdn.test/default.jpg".to_string()),
            url_128: Some("https://cdn.test/128.jpg".to_string()),
            permalink_url: Some("https://cdn.test/permanent.jpg".to_string()),
            width: Some(1080),
            height: Some(1080),
        };
        assert_eq!(image.best_url(), Some("https://cdn.test/permanent.jpg"));
    }

    #[test]
    fn ad_image_best_url_falls_back_in_order() {
        let mut image = AdImage {
            hash: "aaa".to_string(),
            url: Some("https://cdn.test/default.jpg".to_string()),
            url_128: Some("https://cdn.test/128.jpg".to_string()),
            permalink_url: None,
            width: None,
            height: None,
        };
        assert_eq!(image.best_url(), Some("https://cdn.test/128.jpg"));
        image.url_128 = None;
        assert_eq!(image.best_url(), Some("https://cdn.test/default.jpg"));
        image.url = None;
        assert_eq!(image.best_url(), None);
    }

    #[test]
    fn error_envelope_parses() {
        let envelope: ApiErrorEnvelope = serde_json::from_value(serde_json::json!({
            "error": {
                "message": "Unsupported get request",
                "type": "GraphMethodException",
                "code": 100,
                "error_subcode": 33
            }
        }))
        .unwrap();
        assert_eq!(envelope.error.code, 100);
        assert_eq!(envelope.error.error_subcode, Some(33));
    }
}

//! The durable, normalized creative record and its classification tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a creative's media is structurally assembled.
///
/// Derived once at fetch time by the classifier and persisted; never
/// re-inferred at read time. The stored value drives the smart-refresh
/// strategy choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyMode {
    Static,
    StaticCarousel,
    DynamicAssetFeed,
    DynamicCatalog,
}

impl AssemblyMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssemblyMode::Static => "static",
            AssemblyMode::StaticCarousel => "static_carousel",
            AssemblyMode::DynamicAssetFeed => "dynamic_asset_feed",
            AssemblyMode::DynamicCatalog => "dynamic_catalog",
        }
    }
}

impl std::str::FromStr for AssemblyMode {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(AssemblyMode::Static),
            "static_carousel" => Ok(AssemblyMode::StaticCarousel),
            "dynamic_asset_feed" => Ok(AssemblyMode::DynamicAssetFeed),
            "dynamic_catalog" => Ok(AssemblyMode::DynamicCatalog),
            other => Err(ParseTagError {
                tag: "assembly_mode",
                value: other.to_string(),
            }),
        }
    }
}

/// The kind of asset(s) a creative uses.
///
/// A creative with neither an image nor a video reference is classified
/// `Image` — "no media found" is deliberately not a distinct type; downstream
/// consumers depend on the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Mixed,
}

impl MediaType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Mixed => "mixed",
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "mixed" => Ok(MediaType::Mixed),
            other => Err(ParseTagError {
                tag: "media_type",
                value: other.to_string(),
            }),
        }
    }
}

/// A stored classification tag did not match any known variant.
#[derive(Debug, Error)]
#[error("unknown {tag} value: \"{value}\"")]
pub struct ParseTagError {
    pub tag: &'static str,
    pub value: String,
}

/// One carousel-slot descriptor on a normalized record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildAttachment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_hash: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
}

/// The durable, normalized unit persisted per creative id.
///
/// `image_urls`/`image_hashes` and `video_ids`/`video_urls` are replaced
/// wholesale by an enrichment pass, never partially mutated.
/// `last_fetched_at` is the sole freshness signal and only moves on a full
/// fetch-and-store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeRecord {
    pub creative_id: String,
    pub ad_account_id: Option<String>,
    pub name: Option<String>,
    pub primary_text: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub thumbnail_url: Option<String>,
    pub child_attachments: Vec<ChildAttachment>,
    pub call_to_action: Option<serde_json::Value>,
    pub assembly_mode: AssemblyMode,
    pub media_type: MediaType,
    pub image_hashes: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_ids: Vec<String>,
    pub video_urls: Vec<String>,
    pub preview_fragments: Vec<String>,
    /// Verbatim upstream payload, retained for audit/replay.
    pub raw_payload: Option<serde_json::Value>,
    pub last_fetched_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_mode_round_trips_through_str() {
        for mode in [
            AssemblyMode::Static,
            AssemblyMode::StaticCarousel,
            AssemblyMode::DynamicAssetFeed,
            AssemblyMode::DynamicCatalog,
        ] {
            assert_eq!(mode.as_str().parse::<AssemblyMode>().unwrap(), mode);
        }
    }

    #[test]
    fn media_type_round_trips_through_str() {
        for mt in [MediaType::Image, MediaType::Video, MediaType::Mixed] {
            assert_eq!(mt.as_str().parse::<MediaType>().unwrap(), mt);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "carousel-ish".parse::<AssemblyMode>().unwrap_err();
        assert_eq!(err.tag, "assembly_mode");
    }
}

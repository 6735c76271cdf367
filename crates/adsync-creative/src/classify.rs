//! Pure classification of a raw creative payload into its two orthogonal
//! tags: assembly mode and media type.
//!
//! Classification never inspects raw JSON directly — the payload is first
//! reduced to a [`CreativeShape`], and the assembly rules run against that
//! normalized view as an explicit ordered list, first match wins. Absent or
//! malformed sub-structures read as "not present"; classification never fails.

use adsync_graph::RawCreative;

use crate::record::{AssemblyMode, MediaType};

/// Normalized structural view of a raw creative payload — everything the
/// classification rules are allowed to look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreativeShape {
    pub carousel_slot_count: usize,
    pub has_catalog_feed: bool,
    pub feed_image_count: usize,
    pub feed_video_count: usize,
    pub has_direct_image: bool,
    pub has_direct_video: bool,
    pub carousel_has_image: bool,
    pub carousel_has_video: bool,
}

/// Ordered assembly-mode rules. Evaluated top to bottom; the first predicate
/// that matches wins. Payloads matching no rule are STATIC (single image,
/// single video, or no media at all).
const ASSEMBLY_RULES: &[(fn(&CreativeShape) -> bool, AssemblyMode)] = &[
    (
        |shape| shape.carousel_slot_count > 1,
        AssemblyMode::StaticCarousel,
    ),
    (|shape| shape.has_catalog_feed, AssemblyMode::DynamicCatalog),
    (
        |shape| shape.feed_image_count > 0 || shape.feed_video_count > 0,
        AssemblyMode::DynamicAssetFeed,
    ),
];

/// Reduces a raw creative payload to its structural shape.
#[must_use]
pub fn shape_of(raw: &RawCreative) -> CreativeShape {
    let story = raw.object_story_spec.as_ref();
    let link = story.and_then(|s| s.link_data.as_ref());
    let video = story.and_then(|s| s.video_data.as_ref());
    let photo = story.and_then(|s| s.photo_data.as_ref());
    let template = story.and_then(|s| s.template_data.as_ref());
    let feed = raw.asset_feed_spec.as_ref();

    let slots: &[adsync_graph::RawChildAttachment] =
        link.map_or(&[], |l| l.child_attachments.as_slice());

    let has_direct_image = raw.image_url.is_some()
        || raw.image_hash.is_some()
        || link.is_some_and(|l| l.picture.is_some() || l.image_hash.is_some())
        || photo.is_some_and(|p| p.image_hash.is_some() || p.url.is_some());

    let has_direct_video = video.is_some_and(|v| v.video_id.is_some());

    CreativeShape {
        carousel_slot_count: slots.len(),
        has_catalog_feed: raw.product_set_id.is_some() || template.is_some(),
        feed_image_count: feed.map_or(0, |f| f.images.len()),
        feed_video_count: feed.map_or(0, |f| f.videos.len()),
        has_direct_image,
        has_direct_video,
        carousel_has_image: slots
            .iter()
            .any(|s| s.image_hash.is_some() || s.picture.is_some()),
        carousel_has_video: slots.iter().any(|s| s.video_id.is_some()),
    }
}

/// Derives the assembly mode from a normalized shape.
#[must_use]
pub fn classify_assembly(shape: &CreativeShape) -> AssemblyMode {
    ASSEMBLY_RULES
        .iter()
        .find(|(matches, _)| matches(shape))
        .map_or(AssemblyMode::Static, |(_, mode)| *mode)
}

/// Derives the media type from a normalized shape.
///
/// Both image-bearing and video-bearing references present → MIXED; only
/// video → VIDEO; otherwise IMAGE (including the no-media-at-all case).
#[must_use]
pub fn classify_media(shape: &CreativeShape) -> MediaType {
    let image = shape.has_direct_image || shape.feed_image_count > 0 || shape.carousel_has_image;
    let video = shape.has_direct_video || shape.feed_video_count > 0 || shape.carousel_has_video;
    match (image, video) {
        (true, true) => MediaType::Mixed,
        (false, true) => MediaType::Video,
        _ => MediaType::Image,
    }
}

/// Classifies a raw payload into both tags in one pass.
#[must_use]
pub fn classify(raw: &RawCreative) -> (AssemblyMode, MediaType) {
    let shape = shape_of(raw);
    (classify_assembly(&shape), classify_media(&shape))
}

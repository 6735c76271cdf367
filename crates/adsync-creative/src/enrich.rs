//! Mode-specific media enrichment.
//!
//! Each pass takes the raw payload plus the derived assembly mode and
//! produces a fresh [`MediaBundle`] assembled once — no cross-branch
//! accumulation. Every resolution call is independently fault-isolated: one
//! failed image or video never aborts the rest of the pass, and the caller
//! always gets a bundle to persist.

use std::collections::HashMap;

use adsync_graph::{LinkData, PhotoData, RawCreative, VideoData};

use crate::record::{AssemblyMode, ChildAttachment};
use crate::resolver::{MediaResolver, VideoResolution};

/// The media-bearing subset of a creative record, produced by one
/// enrichment pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaBundle {
    pub thumbnail_url: Option<String>,
    pub child_attachments: Vec<ChildAttachment>,
    pub image_hashes: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_ids: Vec<String>,
    pub video_urls: Vec<String>,
    pub preview_fragments: Vec<String>,
}

/// Tunable enrichment behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrichOptions {
    /// Resolve per-video source URLs for dynamic asset feeds. Off by
    /// default: feed videos belong to the platform's asset library and the
    /// tokens this service holds cannot read their sources, so the default
    /// path renders one preview fragment per creative instead.
    pub resolve_feed_videos: bool,
}

/// Runs the mode-specific enrichment strategy, then the shape-agnostic
/// image fallback.
pub async fn enrich(
    raw: &RawCreative,
    mode: AssemblyMode,
    resolver: &MediaResolver<'_>,
    opts: EnrichOptions,
) -> MediaBundle {
    let bundle = match mode {
        AssemblyMode::Static => enrich_static(raw, resolver).await,
        AssemblyMode::StaticCarousel => enrich_carousel(raw, resolver).await,
        AssemblyMode::DynamicAssetFeed => enrich_asset_feed(raw, resolver, opts).await,
        AssemblyMode::DynamicCatalog => MediaBundle::default(),
    };
    apply_image_fallback(raw, mode, bundle, resolver).await
}

fn link_data(raw: &RawCreative) -> Option<&LinkData> {
    raw.object_story_spec.as_ref()?.link_data.as_ref()
}

fn video_data(raw: &RawCreative) -> Option<&VideoData> {
    raw.object_story_spec.as_ref()?.video_data.as_ref()
}

fn photo_data(raw: &RawCreative) -> Option<&PhotoData> {
    raw.object_story_spec.as_ref()?.photo_data.as_ref()
}

/// Direct image URL on a static creative, if any: no network call needed.
fn static_image_url(raw: &RawCreative) -> Option<String> {
    raw.image_url
        .clone()
        .or_else(|| link_data(raw).and_then(|l| l.picture.clone()))
        .or_else(|| photo_data(raw).and_then(|p| p.url.clone()))
}

/// The image hash a static creative would resolve, if any.
fn static_image_hash(raw: &RawCreative) -> Option<&str> {
    raw.image_hash
        .as_deref()
        .or_else(|| link_data(raw).and_then(|l| l.image_hash.as_deref()))
        .or_else(|| photo_data(raw).and_then(|p| p.image_hash.as_deref()))
}

/// STATIC: one video, one direct image, one hashed image, or nothing.
async fn enrich_static(raw: &RawCreative, resolver: &MediaResolver<'_>) -> MediaBundle {
    if let Some(video_id) = video_data(raw).and_then(|v| v.video_id.clone()) {
        return match resolver.resolve_video(&video_id).await {
            VideoResolution::Resolved(video) => MediaBundle {
                thumbnail_url: video.thumbnail_url,
                video_ids: vec![video_id],
                video_urls: vec![video.source_url],
                ..MediaBundle::default()
            },
            VideoResolution::Denied | VideoResolution::NoSource => {
                let fragment = resolver.resolve_preview_fragment(&raw.id).await;
                MediaBundle {
                    video_ids: vec![video_id],
                    preview_fragments: fragment.into_iter().collect(),
                    ..MediaBundle::default()
                }
            }
            VideoResolution::Failed => MediaBundle {
                video_ids: vec![video_id],
                ..MediaBundle::default()
            },
        };
    }

    if let Some(url) = static_image_url(raw) {
        // Zero-cost path: the payload already carries a usable URL.
        return MediaBundle {
            image_hashes: static_image_hash(raw)
                .map(str::to_owned)
                .into_iter()
                .collect(),
            image_urls: vec![url],
            ..MediaBundle::default()
        };
    }

    if let Some(hash) = static_image_hash(raw) {
        if let Some(image) = resolver.resolve_image_hash(hash).await {
            return MediaBundle {
                image_hashes: vec![image.hash],
                image_urls: vec![image.url],
                ..MediaBundle::default()
            };
        }
    }

    MediaBundle::default()
}

/// STATIC_CAROUSEL: batch-resolve every slot hash, then re-associate the
/// resolved URLs back to their slots. Unresolvable hashes are dropped, not
/// replaced with placeholders.
async fn enrich_carousel(raw: &RawCreative, resolver: &MediaResolver<'_>) -> MediaBundle {
    let slots = link_data(raw).map_or(&[][..], |l| l.child_attachments.as_slice());

    let slot_hashes: Vec<String> = slots.iter().filter_map(|s| s.image_hash.clone()).collect();
    let resolved = resolver.resolve_image_hashes(&slot_hashes).await;
    let url_by_hash: HashMap<&str, &str> = resolved
        .iter()
        .map(|r| (r.hash.as_str(), r.url.as_str()))
        .collect();

    let child_attachments: Vec<ChildAttachment> = slots
        .iter()
        .map(|s| ChildAttachment {
            name: s.name.clone(),
            description: s.description.clone(),
            image_url: s.picture.clone().or_else(|| {
                s.image_hash
                    .as_deref()
                    .and_then(|h| url_by_hash.get(h).map(|u| (*u).to_owned()))
            }),
            image_hash: s.image_hash.clone(),
            link: s.link.clone(),
            video_id: s.video_id.clone(),
        })
        .collect();

    MediaBundle {
        child_attachments,
        image_hashes: resolved.iter().map(|r| r.hash.clone()).collect(),
        image_urls: resolved.iter().map(|r| r.url.clone()).collect(),
        video_ids: slots.iter().filter_map(|s| s.video_id.clone()).collect(),
        ..MediaBundle::default()
    }
}

/// DYNAMIC_ASSET_FEED: feed images split into URL-carrying (free) and
/// hash-only (batched) groups; feed videos are either skipped in favor of a
/// single creative-level preview (default) or resolved individually.
async fn enrich_asset_feed(
    raw: &RawCreative,
    resolver: &MediaResolver<'_>,
    opts: EnrichOptions,
) -> MediaBundle {
    let feed = raw.asset_feed_spec.clone().unwrap_or_default();

    let mut image_hashes = Vec::new();
    let mut image_urls = Vec::new();
    let mut pending_hashes = Vec::new();
    for image in &feed.images {
        match (&image.url, &image.hash) {
            (Some(url), hash) => {
                if let Some(h) = hash {
                    image_hashes.push(h.clone());
                }
                image_urls.push(url.clone());
            }
            (None, Some(hash)) => pending_hashes.push(hash.clone()),
            (None, None) => {}
        }
    }
    for image in resolver.resolve_image_hashes(&pending_hashes).await {
        image_hashes.push(image.hash);
        image_urls.push(image.url);
    }

    let mut thumbnail_url = None;
    let mut video_ids = Vec::new();
    let mut video_urls = Vec::new();
    let mut preview_fragments = Vec::new();
    if !feed.videos.is_empty() {
        if opts.resolve_feed_videos {
            let mut unplayable = false;
            for video_id in feed.videos.iter().filter_map(|v| v.video_id.clone()) {
                match resolver.resolve_video(&video_id).await {
                    VideoResolution::Resolved(video) => {
                        video_urls.push(video.source_url);
                        if thumbnail_url.is_none() {
                            thumbnail_url = video.thumbnail_url;
                        }
                    }
                    VideoResolution::Denied | VideoResolution::NoSource => unplayable = true,
                    VideoResolution::Failed => {}
                }
                video_ids.push(video_id);
            }
            if video_urls.is_empty() && unplayable {
                preview_fragments
                    .extend(resolver.resolve_preview_fragment(&raw.id).await);
            }
        } else {
            preview_fragments.extend(resolver.resolve_preview_fragment(&raw.id).await);
        }
    }

    MediaBundle {
        thumbnail_url,
        child_attachments: Vec::new(),
        image_hashes,
        image_urls,
        video_ids,
        video_urls,
        preview_fragments,
    }
}

/// Last-resort image resolution: if the pass produced no image URL but the
/// payload carries a top-level hash that was never attempted, try it once.
/// Guarantees every static-shaped creative gets at least one resolution
/// attempt even when mode detection mis-assigned it.
async fn apply_image_fallback(
    raw: &RawCreative,
    mode: AssemblyMode,
    bundle: MediaBundle,
    resolver: &MediaResolver<'_>,
) -> MediaBundle {
    if !bundle.image_urls.is_empty() {
        return bundle;
    }
    let Some(hash) = raw.image_hash.as_deref() else {
        return bundle;
    };
    if hash_already_attempted(raw, mode, hash) {
        return bundle;
    }
    match resolver.resolve_image_hash(hash).await {
        Some(image) => MediaBundle {
            image_hashes: vec![image.hash],
            image_urls: vec![image.url],
            ..bundle
        },
        None => bundle,
    }
}

/// Whether the mode-specific pass already tried to resolve `hash`.
fn hash_already_attempted(raw: &RawCreative, mode: AssemblyMode, hash: &str) -> bool {
    match mode {
        AssemblyMode::Static => {
            video_data(raw).and_then(|v| v.video_id.as_ref()).is_none()
                && static_image_url(raw).is_none()
                && static_image_hash(raw) == Some(hash)
        }
        AssemblyMode::StaticCarousel => link_data(raw).is_some_and(|l| {
            l.child_attachments
                .iter()
                .any(|s| s.image_hash.as_deref() == Some(hash))
        }),
        AssemblyMode::DynamicAssetFeed => raw.asset_feed_spec.as_ref().is_some_and(|f| {
            f.images
                .iter()
                .any(|i| i.url.is_none() && i.hash.as_deref() == Some(hash))
        }),
        AssemblyMode::DynamicCatalog => false,
    }
}

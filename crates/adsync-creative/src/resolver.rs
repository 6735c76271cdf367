//! Media resolution against the ad platform, scoped to one account + token.
//!
//! Every gateway error is absorbed here: logged and converted to an empty or
//! typed-fallback outcome. Transport errors never propagate past this module —
//! enrichment always proceeds with whatever resolved.

use std::collections::HashSet;

use adsync_graph::{GraphClient, VideoDetail, VideoThumbnail};

/// Ad format requested when rendering a preview fragment.
const PREVIEW_AD_FORMAT: &str = "DESKTOP_FEED_STANDARD";

/// A resolved image: durable URL plus dimensions when the platform reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub hash: String,
    pub url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// A resolved video: playable source plus the best available thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVideo {
    pub source_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<f64>,
}

/// Outcome of a video resolution attempt.
///
/// `Denied` and `NoSource` trigger the preview-fragment fallback; `Failed`
/// (transport-class) does not — a retriable outage should not burn a preview
/// render.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoResolution {
    Resolved(ResolvedVideo),
    /// The video exists but exposes no playable source.
    NoSource,
    /// Permission-class API error: the token cannot read the video.
    Denied,
    /// Transport or other gateway failure.
    Failed,
}

/// Resolves opaque media references (image hashes, video ids) to durable
/// URLs for a single ad account and access token.
pub struct MediaResolver<'a> {
    graph: &'a GraphClient,
    token: &'a str,
    account_id: &'a str,
}

impl<'a> MediaResolver<'a> {
    #[must_use]
    pub fn new(graph: &'a GraphClient, token: &'a str, account_id: &'a str) -> Self {
        Self {
            graph,
            token,
            account_id,
        }
    }

    /// Resolves a single image hash. `None` on any failure or if the account
    /// no longer knows the hash.
    pub async fn resolve_image_hash(&self, hash: &str) -> Option<ResolvedImage> {
        match self
            .graph
            .get_image_batch(self.token, self.account_id, &[hash.to_owned()])
            .await
        {
            Ok(images) => images.into_iter().find_map(into_resolved),
            Err(e) => {
                tracing::warn!(hash, error = %e, "image hash resolution failed");
                None
            }
        }
    }

    /// Resolves many image hashes in one round trip.
    ///
    /// Duplicates are removed up front (first occurrence wins the position).
    /// On batch failure, falls back to sequential single-hash calls so one
    /// poisoned batch cannot lose every image. Results follow the input
    /// order; unresolvable hashes are absent, not placeholders.
    pub async fn resolve_image_hashes(&self, hashes: &[String]) -> Vec<ResolvedImage> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = hashes
            .iter()
            .filter(|h| seen.insert(h.as_str()))
            .cloned()
            .collect();
        if unique.is_empty() {
            return Vec::new();
        }

        match self
            .graph
            .get_image_batch(self.token, self.account_id, &unique)
            .await
        {
            Ok(images) => {
                let resolved: Vec<ResolvedImage> =
                    images.into_iter().filter_map(into_resolved).collect();
                // Re-order to match the input: the platform does not promise
                // response order.
                let mut by_hash: std::collections::HashMap<String, ResolvedImage> = resolved
                    .into_iter()
                    .map(|r| (r.hash.clone(), r))
                    .collect();
                unique.iter().filter_map(|h| by_hash.remove(h)).collect()
            }
            Err(e) => {
                tracing::warn!(
                    count = unique.len(),
                    error = %e,
                    "batched image resolution failed — falling back to sequential lookups"
                );
                let mut resolved = Vec::new();
                for hash in &unique {
                    if let Some(image) = self.resolve_image_hash(hash).await {
                        resolved.push(image);
                    }
                }
                resolved
            }
        }
    }

    /// Resolves a video id to a playable source and thumbnail.
    pub async fn resolve_video(&self, video_id: &str) -> VideoResolution {
        match self.graph.get_video(self.token, video_id).await {
            Ok(detail) => match detail.source.clone() {
                Some(source_url) => VideoResolution::Resolved(ResolvedVideo {
                    source_url,
                    thumbnail_url: pick_thumbnail(&detail),
                    duration_seconds: detail.length,
                }),
                None => {
                    tracing::debug!(video_id, "video has no playable source");
                    VideoResolution::NoSource
                }
            },
            Err(e) if e.is_permission_denied() => {
                tracing::debug!(video_id, error = %e, "video source access denied");
                VideoResolution::Denied
            }
            Err(e) => {
                tracing::warn!(video_id, error = %e, "video resolution failed");
                VideoResolution::Failed
            }
        }
    }

    /// Fetches one embeddable preview fragment for a creative. `None` on any
    /// failure or if the platform returns no previews.
    pub async fn resolve_preview_fragment(&self, creative_id: &str) -> Option<String> {
        match self
            .graph
            .get_previews(self.token, creative_id, PREVIEW_AD_FORMAT)
            .await
        {
            Ok(previews) => previews.into_iter().next().map(|p| p.body),
            Err(e) => {
                tracing::warn!(creative_id, error = %e, "preview fragment fetch failed");
                None
            }
        }
    }
}

fn into_resolved(image: adsync_graph::AdImage) -> Option<ResolvedImage> {
    let url = image.best_url()?.to_owned();
    Some(ResolvedImage {
        hash: image.hash,
        url,
        width: image.width,
        height: image.height,
    })
}

/// Picks the largest thumbnail variant by area, falling back to reported
/// scale, then to the video's default picture.
fn pick_thumbnail(detail: &VideoDetail) -> Option<String> {
    let variants: &[VideoThumbnail] = detail.thumbnails.as_ref().map_or(&[], |t| t.data.as_slice());
    variants
        .iter()
        .max_by_key(|t| thumbnail_weight(t))
        .map(|t| t.uri.clone())
        .or_else(|| detail.picture.clone())
}

#[allow(clippy::cast_possible_truncation)]
fn thumbnail_weight(t: &VideoThumbnail) -> i64 {
    let area = t.width.unwrap_or(0).saturating_mul(t.height.unwrap_or(0));
    if area > 0 {
        area
    } else {
        (t.scale.unwrap_or(0.0) * 1000.0) as i64
    }
}

//! Normalization of a raw creative payload plus its enrichment output into
//! a [`CreativeRecord`] suitable for persistence.

use chrono::{DateTime, Utc};

use adsync_graph::RawCreative;

use crate::enrich::MediaBundle;
use crate::record::{AssemblyMode, CreativeRecord, MediaType};

/// Assembles the durable record from a fetched payload, its classification
/// tags, and the media produced by one enrichment pass.
///
/// Text fields follow the platform's precedence: story-spec link data first,
/// then video data, then the creative's own top-level fields.
#[must_use]
pub fn build_creative_record(
    raw: &RawCreative,
    raw_payload: serde_json::Value,
    assembly_mode: AssemblyMode,
    media_type: MediaType,
    bundle: MediaBundle,
    fetched_at: DateTime<Utc>,
) -> CreativeRecord {
    let story = raw.object_story_spec.as_ref();
    let link = story.and_then(|s| s.link_data.as_ref());
    let video = story.and_then(|s| s.video_data.as_ref());
    let template = story.and_then(|s| s.template_data.as_ref());

    let primary_text = link
        .and_then(|l| l.message.clone())
        .or_else(|| video.and_then(|v| v.message.clone()))
        .or_else(|| template.and_then(|t| t.message.clone()))
        .or_else(|| raw.body.clone());

    let headline = link
        .and_then(|l| l.name.clone())
        .or_else(|| video.and_then(|v| v.title.clone()))
        .or_else(|| raw.title.clone());

    let description = link
        .and_then(|l| l.description.clone())
        .or_else(|| template.and_then(|t| t.description.clone()));

    let call_to_action = link
        .and_then(|l| l.call_to_action.clone())
        .or_else(|| video.and_then(|v| v.call_to_action.clone()))
        .or_else(|| {
            raw.call_to_action_type
                .clone()
                .map(serde_json::Value::String)
        });

    let thumbnail_url = bundle
        .thumbnail_url
        .or_else(|| bundle.image_urls.first().cloned())
        .or_else(|| raw.thumbnail_url.clone());

    CreativeRecord {
        creative_id: raw.id.clone(),
        ad_account_id: raw.account_id.clone(),
        name: raw.name.clone(),
        primary_text,
        headline,
        description,
        body: raw.body.clone(),
        thumbnail_url,
        child_attachments: bundle.child_attachments,
        call_to_action,
        assembly_mode,
        media_type,
        image_hashes: bundle.image_hashes,
        image_urls: bundle.image_urls,
        video_ids: bundle.video_ids,
        video_urls: bundle.video_urls,
        preview_fragments: bundle.preview_fragments,
        raw_payload: Some(raw_payload),
        last_fetched_at: fetched_at,
        deleted_at: None,
    }
}

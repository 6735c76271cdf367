//! Persistence seam for creative records.
//!
//! The service only speaks this trait; the Postgres implementation lives in
//! `adsync-db`, and tests use an in-memory fake. Store failures are the one
//! error class the service propagates instead of degrading.

use chrono::NaiveDate;

use crate::record::CreativeRecord;

/// An error from the persistence collaborator.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StoreError(#[from] Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(source))
    }
}

/// Partial update of a record's media columns. `None` fields are left
/// untouched; `Some` fields are replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaUpdate {
    pub thumbnail_url: Option<String>,
    pub image_hashes: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub video_ids: Option<Vec<String>>,
    pub video_urls: Option<Vec<String>>,
    pub preview_fragments: Option<Vec<String>>,
}

impl MediaUpdate {
    /// Applies the update to an in-memory record: `Some` fields replace
    /// their targets, `None` fields leave them untouched. `last_fetched_at`
    /// is never modified.
    pub fn apply(&self, record: &mut CreativeRecord) {
        if let Some(thumbnail_url) = &self.thumbnail_url {
            record.thumbnail_url = Some(thumbnail_url.clone());
        }
        if let Some(image_hashes) = &self.image_hashes {
            record.image_hashes = image_hashes.clone();
        }
        if let Some(image_urls) = &self.image_urls {
            record.image_urls = image_urls.clone();
        }
        if let Some(video_ids) = &self.video_ids {
            record.video_ids = video_ids.clone();
        }
        if let Some(video_urls) = &self.video_urls {
            record.video_urls = video_urls.clone();
        }
        if let Some(preview_fragments) = &self.preview_fragments {
            record.preview_fragments = preview_fragments.clone();
        }
    }
}

/// Read/write capability for creative records, keyed by external creative id.
#[allow(async_fn_in_trait)]
pub trait CreativeStore {
    /// Point lookup. `Ok(None)` when no record exists — not an error.
    async fn find_by_id(&self, creative_id: &str) -> Result<Option<CreativeRecord>, StoreError>;

    /// Batch lookup; ids with no record are simply absent from the result.
    async fn find_by_ids(
        &self,
        creative_ids: &[String],
    ) -> Result<Vec<CreativeRecord>, StoreError>;

    /// Inserts or fully replaces the record for `record.creative_id`.
    async fn upsert(&self, record: &CreativeRecord) -> Result<(), StoreError>;

    /// Applies a partial media update to an existing record. Does not touch
    /// `last_fetched_at` — only a full fetch moves the freshness signal.
    async fn update_media(
        &self,
        creative_id: &str,
        update: &MediaUpdate,
    ) -> Result<(), StoreError>;

    /// Distinct creative ids referenced by analytics records for a client in
    /// a date range (inclusive).
    async fn creative_ids_in_range(
        &self,
        client_id: i64,
        ad_account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, StoreError>;
}

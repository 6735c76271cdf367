//! Database operations for the `creatives` table and the analytics-range
//! query, plus the Postgres-backed [`CreativeStore`] implementation.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use adsync_creative::{
    ChildAttachment, CreativeRecord, CreativeStore, MediaUpdate, StoreError,
};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `creatives` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreativeRow {
    pub id: i64,
    pub public_id: Uuid,
    pub creative_id: String,
    pub ad_account_id: Option<String>,
    pub name: Option<String>,
    pub primary_text: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub thumbnail_url: Option<String>,
    pub child_attachments: Option<serde_json::Value>,
    pub call_to_action: Option<serde_json::Value>,
    pub assembly_mode: String,
    pub media_type: String,
    pub image_hashes: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_ids: Vec<String>,
    pub video_urls: Vec<String>,
    pub preview_fragments: Vec<String>,
    pub raw_payload: Option<serde_json::Value>,
    pub last_fetched_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CreativeRow {
    /// Converts a stored row into the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRecord`] if the stored classification tags
    /// or child-attachment JSON do not parse — a corrupt row, not a caller
    /// mistake.
    pub fn into_record(self) -> Result<CreativeRecord, DbError> {
        let invalid = |reason: String| DbError::InvalidRecord {
            creative_id: self.creative_id.clone(),
            reason,
        };

        let assembly_mode = self
            .assembly_mode
            .parse()
            .map_err(|e| invalid(format!("{e}")))?;
        let media_type = self
            .media_type
            .parse()
            .map_err(|e| invalid(format!("{e}")))?;
        let child_attachments: Vec<ChildAttachment> = match &self.child_attachments {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| invalid(format!("child_attachments: {e}")))?,
            None => Vec::new(),
        };

        Ok(CreativeRecord {
            creative_id: self.creative_id,
            ad_account_id: self.ad_account_id,
            name: self.name,
            primary_text: self.primary_text,
            headline: self.headline,
            description: self.description,
            body: self.body,
            thumbnail_url: self.thumbnail_url,
            child_attachments,
            call_to_action: self.call_to_action,
            assembly_mode,
            media_type,
            image_hashes: self.image_hashes,
            image_urls: self.image_urls,
            video_ids: self.video_ids,
            video_urls: self.video_urls,
            preview_fragments: self.preview_fragments,
            raw_payload: self.raw_payload,
            last_fetched_at: self.last_fetched_at,
            deleted_at: self.deleted_at,
        })
    }
}

const CREATIVE_COLUMNS: &str = "id, public_id, creative_id, ad_account_id, name, primary_text, \
     headline, description, body, thumbnail_url, child_attachments, call_to_action, \
     assembly_mode, media_type, image_hashes, image_urls, video_ids, video_urls, \
     preview_fragments, raw_payload, last_fetched_at, created_at, updated_at, deleted_at";

// ---------------------------------------------------------------------------
// creatives operations
// ---------------------------------------------------------------------------

/// Upserts a creative record.
///
/// Conflicts on `creative_id` replace every mutable field wholesale —
/// enrichment passes never partially mutate media arrays — and preserve the
/// original `created_at`.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_creative(pool: &PgPool, record: &CreativeRecord) -> Result<i64, DbError> {
    let public_id = Uuid::new_v4();
    let child_attachments = serde_json::to_value(&record.child_attachments).ok();

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO creatives \
             (public_id, creative_id, ad_account_id, name, primary_text, headline, \
              description, body, thumbnail_url, child_attachments, call_to_action, \
              assembly_mode, media_type, image_hashes, image_urls, video_ids, \
              video_urls, preview_fragments, raw_payload, last_fetched_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18, $19, $20) \
         ON CONFLICT (creative_id) DO UPDATE SET \
             ad_account_id     = EXCLUDED.ad_account_id, \
             name              = EXCLUDED.name, \
             primary_text      = EXCLUDED.primary_text, \
             headline          = EXCLUDED.headline, \
             description       = EXCLUDED.description, \
             body              = EXCLUDED.body, \
             thumbnail_url     = EXCLUDED.thumbnail_url, \
             child_attachments = EXCLUDED.child_attachments, \
             call_to_action    = EXCLUDED.call_to_action, \
             assembly_mode     = EXCLUDED.assembly_mode, \
             media_type        = EXCLUDED.media_type, \
             image_hashes      = EXCLUDED.image_hashes, \
             image_urls        = EXCLUDED.image_urls, \
             video_ids         = EXCLUDED.video_ids, \
             video_urls        = EXCLUDED.video_urls, \
             preview_fragments = EXCLUDED.preview_fragments, \
             raw_payload       = EXCLUDED.raw_payload, \
             last_fetched_at   = EXCLUDED.last_fetched_at, \
             updated_at        = NOW() \
         RETURNING id",
    )
    .bind(public_id)
    .bind(&record.creative_id)
    .bind(&record.ad_account_id)
    .bind(&record.name)
    .bind(&record.primary_text)
    .bind(&record.headline)
    .bind(&record.description)
    .bind(&record.body)
    .bind(&record.thumbnail_url)
    .bind(child_attachments)
    .bind(&record.call_to_action)
    .bind(record.assembly_mode.as_str())
    .bind(record.media_type.as_str())
    .bind(&record.image_hashes)
    .bind(&record.image_urls)
    .bind(&record.video_ids)
    .bind(&record.video_urls)
    .bind(&record.preview_fragments)
    .bind(&record.raw_payload)
    .bind(record.last_fetched_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns a single non-deleted creative by external creative id, or `None`
/// if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_creative(
    pool: &PgPool,
    creative_id: &str,
) -> Result<Option<CreativeRow>, DbError> {
    let row = sqlx::query_as::<_, CreativeRow>(&format!(
        "SELECT {CREATIVE_COLUMNS} \
         FROM creatives \
         WHERE creative_id = $1 AND deleted_at IS NULL"
    ))
    .bind(creative_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all non-deleted creatives matching any of the given external ids.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_creatives_by_ids(
    pool: &PgPool,
    creative_ids: &[String],
) -> Result<Vec<CreativeRow>, DbError> {
    let rows = sqlx::query_as::<_, CreativeRow>(&format!(
        "SELECT {CREATIVE_COLUMNS} \
         FROM creatives \
         WHERE creative_id = ANY($1) AND deleted_at IS NULL"
    ))
    .bind(creative_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Applies a partial media update to a creative row.
///
/// `None` fields fall through to the current column value via `COALESCE`.
/// Deliberately leaves `last_fetched_at` alone: a media refresh is not a
/// full fetch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_creative_media(
    pool: &PgPool,
    creative_id: &str,
    update: &MediaUpdate,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE creatives SET \
             thumbnail_url     = COALESCE($2, thumbnail_url), \
             image_hashes      = COALESCE($3, image_hashes), \
             image_urls        = COALESCE($4, image_urls), \
             video_ids         = COALESCE($5, video_ids), \
             video_urls        = COALESCE($6, video_urls), \
             preview_fragments = COALESCE($7, preview_fragments), \
             updated_at        = NOW() \
         WHERE creative_id = $1 AND deleted_at IS NULL",
    )
    .bind(creative_id)
    .bind(&update.thumbnail_url)
    .bind(&update.image_hashes)
    .bind(&update.image_urls)
    .bind(&update.video_ids)
    .bind(&update.video_urls)
    .bind(&update.preview_fragments)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the distinct creative ids referenced by analytics rows for a
/// client and account in a date range (inclusive).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn creative_ids_in_range(
    pool: &PgPool,
    client_id: i64,
    ad_account_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<String>, DbError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT creative_id \
         FROM ad_insights \
         WHERE client_id = $1 \
           AND ad_account_id = $2 \
           AND date BETWEEN $3 AND $4 \
           AND creative_id IS NOT NULL",
    )
    .bind(client_id)
    .bind(ad_account_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

// ---------------------------------------------------------------------------
// CreativeStore implementation
// ---------------------------------------------------------------------------

/// Postgres-backed [`CreativeStore`].
#[derive(Clone)]
pub struct PgCreativeStore {
    pool: PgPool,
}

impl PgCreativeStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CreativeStore for PgCreativeStore {
    async fn find_by_id(&self, creative_id: &str) -> Result<Option<CreativeRecord>, StoreError> {
        let row = get_creative(&self.pool, creative_id)
            .await
            .map_err(StoreError::new)?;
        row.map(|r| r.into_record().map_err(StoreError::new))
            .transpose()
    }

    async fn find_by_ids(
        &self,
        creative_ids: &[String],
    ) -> Result<Vec<CreativeRecord>, StoreError> {
        let rows = get_creatives_by_ids(&self.pool, creative_ids)
            .await
            .map_err(StoreError::new)?;
        rows.into_iter()
            .map(|r| r.into_record().map_err(StoreError::new))
            .collect()
    }

    async fn upsert(&self, record: &CreativeRecord) -> Result<(), StoreError> {
        upsert_creative(&self.pool, record)
            .await
            .map(|_| ())
            .map_err(StoreError::new)
    }

    async fn update_media(
        &self,
        creative_id: &str,
        update: &MediaUpdate,
    ) -> Result<(), StoreError> {
        update_creative_media(&self.pool, creative_id, update)
            .await
            .map_err(StoreError::new)
    }

    async fn creative_ids_in_range(
        &self,
        client_id: i64,
        ad_account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, StoreError> {
        creative_ids_in_range(&self.pool, client_id, ad_account_id, start, end)
            .await
            .map_err(StoreError::new)
    }
}

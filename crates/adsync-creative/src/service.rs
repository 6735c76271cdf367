//! The public entry point: get-or-fetch with TTL, batch get, smart refresh,
//! and date-range sync.
//!
//! Degradation policy: upstream fetch/enrichment failures never surface as
//! errors — the last stored record (however stale) is returned when one
//! exists, and `None` otherwise. Store failures are the only error class
//! propagated to callers.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use thiserror::Error;

use adsync_graph::GraphClient;

use crate::classify::classify;
use crate::enrich::{enrich, EnrichOptions};
use crate::normalize::build_creative_record;
use crate::record::{AssemblyMode, CreativeRecord, MediaType};
use crate::resolver::{MediaResolver, VideoResolution};
use crate::store::{CreativeStore, MediaUpdate, StoreError};

/// Errors surfaced by [`CreativeService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Tunable service behavior. Defaults match the documented contract:
/// a 7-day freshness window and at most 10 in-flight upstream fetches.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub cache_ttl_days: i64,
    pub fetch_concurrency: usize,
    pub enrich: EnrichOptions,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            cache_ttl_days: 7,
            fetch_concurrency: 10,
            enrich: EnrichOptions::default(),
        }
    }
}

/// Result of a date-range sync: per-creative successes and failures counted
/// independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub saved: usize,
    pub failed: usize,
    pub creative_ids: Vec<String>,
}

/// Orchestrates fetch → classify → enrich → store around a [`CreativeStore`].
pub struct CreativeService<S> {
    store: S,
    graph: GraphClient,
    opts: ServiceOptions,
}

impl<S: CreativeStore> CreativeService<S> {
    pub fn new(store: S, graph: GraphClient, opts: ServiceOptions) -> Self {
        Self { store, graph, opts }
    }

    /// Returns the creative, serving from the store when fresh.
    ///
    /// Freshness: `now − last_fetched_at < cache_ttl_days`. A fresh hit
    /// performs zero network calls. On miss or `force_refresh`, runs the
    /// full fetch pipeline; if that fails and a stored record exists, the
    /// stale record is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] on persistence failure. Upstream
    /// failures degrade to the stored record or `Ok(None)`.
    pub async fn get(
        &self,
        creative_id: &str,
        account_id: &str,
        token: &str,
        force_refresh: bool,
    ) -> Result<Option<CreativeRecord>, ServiceError> {
        let stored = self.store.find_by_id(creative_id).await?;

        if !force_refresh {
            if let Some(record) = &stored {
                if self.is_fresh(record) {
                    tracing::debug!(creative_id, "creative cache hit");
                    return Ok(stored);
                }
            }
        }

        match self.fetch_and_store(creative_id, account_id, token).await? {
            Some(record) => Ok(Some(record)),
            None => {
                if stored.is_some() {
                    tracing::warn!(creative_id, "fetch failed — serving stale stored creative");
                }
                Ok(stored)
            }
        }
    }

    /// Batch get: fresh records come from the store, the rest are fetched
    /// with bounded concurrency. A failed fetch omits that id from the
    /// result map; it never aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] on persistence failure.
    pub async fn get_many(
        &self,
        creative_ids: &[String],
        account_id: &str,
        token: &str,
    ) -> Result<HashMap<String, CreativeRecord>, ServiceError> {
        let mut seen = std::collections::HashSet::new();
        let unique: Vec<String> = creative_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let mut stored_by_id: HashMap<String, CreativeRecord> = self
            .store
            .find_by_ids(&unique)
            .await?
            .into_iter()
            .map(|r| (r.creative_id.clone(), r))
            .collect();

        let mut result = HashMap::new();
        let mut needs_fetch = Vec::new();
        for id in unique {
            match stored_by_id.remove(&id) {
                Some(record) if self.is_fresh(&record) => {
                    result.insert(id, record);
                }
                _ => needs_fetch.push(id),
            }
        }
        tracing::debug!(
            fresh = result.len(),
            fetching = needs_fetch.len(),
            "partitioned batch get"
        );

        let fetched: Vec<(String, Result<Option<CreativeRecord>, ServiceError>)> =
            stream::iter(needs_fetch)
                .map(|id| async move {
                    let outcome = self.fetch_and_store(&id, account_id, token).await;
                    (id, outcome)
                })
                .buffer_unordered(self.opts.fetch_concurrency.max(1))
                .collect()
                .await;

        for (id, outcome) in fetched {
            match outcome? {
                Some(record) => {
                    result.insert(id, record);
                }
                None => {
                    tracing::error!(creative_id = %id, "creative fetch failed — omitting from batch result");
                }
            }
        }

        Ok(result)
    }

    /// Smart refresh: re-derives only the media that is likely stale, using
    /// the *stored* assembly mode and media type to pick the cheapest
    /// correct strategy. Falls back to a full forced fetch when no record or
    /// no stored media reference exists.
    ///
    /// The trade-off is explicit: refresh cost is proportional to what was
    /// stored, so a creative whose upstream shape changed category entirely
    /// is not corrected until a forced full fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] on persistence failure.
    pub async fn refresh(
        &self,
        creative_id: &str,
        account_id: &str,
        token: &str,
    ) -> Result<Option<CreativeRecord>, ServiceError> {
        let Some(stored) = self.store.find_by_id(creative_id).await? else {
            return self.get(creative_id, account_id, token, true).await;
        };

        let resolver = MediaResolver::new(&self.graph, token, account_id);

        let hash_refreshable = matches!(
            stored.assembly_mode,
            AssemblyMode::DynamicAssetFeed
                | AssemblyMode::DynamicCatalog
                | AssemblyMode::StaticCarousel
        ) && !stored.image_hashes.is_empty();
        if hash_refreshable {
            return self.refresh_stored_hashes(stored, &resolver).await;
        }

        if matches!(stored.media_type, MediaType::Video | MediaType::Mixed) {
            if let Some(video_id) = stored.video_ids.first().cloned() {
                return self.refresh_stored_video(stored, &video_id, &resolver).await;
            }
        }

        // Plain static image, or a stored shape with nothing to re-resolve.
        self.get(creative_id, account_id, token, true).await
    }

    /// Collects the distinct creative ids referenced by analytics records in
    /// a date range and forces a fresh fetch for each, with the same bounded
    /// fan-out as [`CreativeService::get_many`]. Per-creative failures are
    /// counted, never fatal — including store failures on individual upserts.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] only if the id collection itself fails.
    pub async fn fetch_and_save_for_date_range(
        &self,
        client_id: i64,
        account_id: &str,
        token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SyncOutcome, ServiceError> {
        let creative_ids = self
            .store
            .creative_ids_in_range(client_id, account_id, start, end)
            .await?;
        tracing::info!(
            client_id,
            count = creative_ids.len(),
            %start,
            %end,
            "syncing creatives for date range"
        );

        let outcomes: Vec<Result<Option<CreativeRecord>, ServiceError>> =
            stream::iter(creative_ids.iter().cloned())
                .map(|id| async move { self.fetch_and_store(&id, account_id, token).await })
                .buffer_unordered(self.opts.fetch_concurrency.max(1))
                .collect()
                .await;

        let mut saved = 0usize;
        let mut failed = 0usize;
        for outcome in outcomes {
            match outcome {
                Ok(Some(_)) => saved += 1,
                Ok(None) => failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "creative save failed during range sync");
                    failed += 1;
                }
            }
        }

        Ok(SyncOutcome {
            saved,
            failed,
            creative_ids,
        })
    }

    fn is_fresh(&self, record: &CreativeRecord) -> bool {
        Utc::now() - record.last_fetched_at < Duration::days(self.opts.cache_ttl_days)
    }

    /// Full pipeline: fetch → classify → enrich → upsert. `Ok(None)` means
    /// the upstream fetch failed; store errors propagate.
    async fn fetch_and_store(
        &self,
        creative_id: &str,
        account_id: &str,
        token: &str,
    ) -> Result<Option<CreativeRecord>, ServiceError> {
        let (raw, payload) = match self.graph.get_creative(token, creative_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(creative_id, error = %e, "creative fetch failed");
                return Ok(None);
            }
        };

        let (assembly_mode, media_type) = classify(&raw);
        let resolver = MediaResolver::new(&self.graph, token, account_id);
        let bundle = enrich(&raw, assembly_mode, &resolver, self.opts.enrich).await;
        let record = build_creative_record(
            &raw,
            payload,
            assembly_mode,
            media_type,
            bundle,
            Utc::now(),
        );

        self.store.upsert(&record).await?;
        tracing::info!(
            creative_id,
            assembly_mode = assembly_mode.as_str(),
            media_type = media_type.as_str(),
            images = record.image_urls.len(),
            videos = record.video_urls.len(),
            "creative fetched and stored"
        );
        Ok(Some(record))
    }

    async fn refresh_stored_hashes(
        &self,
        stored: CreativeRecord,
        resolver: &MediaResolver<'_>,
    ) -> Result<Option<CreativeRecord>, ServiceError> {
        let resolved = resolver.resolve_image_hashes(&stored.image_hashes).await;
        if resolved.is_empty() {
            tracing::warn!(
                creative_id = %stored.creative_id,
                "hash refresh resolved nothing — keeping stored media"
            );
            return Ok(Some(stored));
        }

        let update = MediaUpdate {
            thumbnail_url: resolved.first().map(|r| r.url.clone()),
            image_hashes: Some(resolved.iter().map(|r| r.hash.clone()).collect()),
            image_urls: Some(resolved.iter().map(|r| r.url.clone()).collect()),
            ..MediaUpdate::default()
        };
        self.store.update_media(&stored.creative_id, &update).await?;

        let mut updated = stored;
        update.apply(&mut updated);
        Ok(Some(updated))
    }

    async fn refresh_stored_video(
        &self,
        stored: CreativeRecord,
        video_id: &str,
        resolver: &MediaResolver<'_>,
    ) -> Result<Option<CreativeRecord>, ServiceError> {
        let update = match resolver.resolve_video(video_id).await {
            VideoResolution::Resolved(video) => MediaUpdate {
                thumbnail_url: video.thumbnail_url,
                video_ids: Some(vec![video_id.to_owned()]),
                video_urls: Some(vec![video.source_url]),
                preview_fragments: Some(Vec::new()),
                ..MediaUpdate::default()
            },
            VideoResolution::Denied | VideoResolution::NoSource => {
                let fragment = resolver
                    .resolve_preview_fragment(&stored.creative_id)
                    .await;
                MediaUpdate {
                    video_ids: Some(vec![video_id.to_owned()]),
                    video_urls: Some(Vec::new()),
                    preview_fragments: Some(fragment.into_iter().collect()),
                    ..MediaUpdate::default()
                }
            }
            VideoResolution::Failed => {
                tracing::warn!(
                    creative_id = %stored.creative_id,
                    video_id,
                    "video refresh failed — keeping stored media"
                );
                return Ok(Some(stored));
            }
        };

        self.store.update_media(&stored.creative_id, &update).await?;

        let mut updated = stored;
        update.apply(&mut updated);
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChildAttachment;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// In-memory store fake. Seed it before handing it to the service.
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<String, CreativeRecord>>,
        insight_ids: Vec<String>,
    }

    impl MemoryStore {
        fn seeded(records: Vec<CreativeRecord>) -> Self {
            Self {
                records: Mutex::new(
                    records
                        .into_iter()
                        .map(|r| (r.creative_id.clone(), r))
                        .collect(),
                ),
                insight_ids: Vec::new(),
            }
        }
    }

    impl CreativeStore for MemoryStore {
        async fn find_by_id(
            &self,
            creative_id: &str,
        ) -> Result<Option<CreativeRecord>, StoreError> {
            Ok(self.records.lock().unwrap().get(creative_id).cloned())
        }

        async fn find_by_ids(
            &self,
            creative_ids: &[String],
        ) -> Result<Vec<CreativeRecord>, StoreError> {
            let records = self.records.lock().unwrap();
            Ok(creative_ids
                .iter()
                .filter_map(|id| records.get(id).cloned())
                .collect())
        }

        async fn upsert(&self, record: &CreativeRecord) -> Result<(), StoreError> {
            self.records
                .lock()
                .unwrap()
                .insert(record.creative_id.clone(), record.clone());
            Ok(())
        }

        async fn update_media(
            &self,
            creative_id: &str,
            update: &MediaUpdate,
        ) -> Result<(), StoreError> {
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.get_mut(creative_id) {
                update.apply(record);
            }
            Ok(())
        }

        async fn creative_ids_in_range(
            &self,
            _client_id: i64,
            _ad_account_id: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<String>, StoreError> {
            Ok(self.insight_ids.clone())
        }
    }

    fn record_fetched_days_ago(creative_id: &str, days: i64) -> CreativeRecord {
        CreativeRecord {
            creative_id: creative_id.to_string(),
            ad_account_id: Some("42".to_string()),
            name: Some("stored creative".to_string()),
            primary_text: Some("stored text".to_string()),
            headline: None,
            description: None,
            body: None,
            thumbnail_url: Some("https://cdn.test/old-thumb.jpg".to_string()),
            child_attachments: Vec::new(),
            call_to_action: None,
            assembly_mode: AssemblyMode::Static,
            media_type: MediaType::Image,
            image_hashes: Vec::new(),
            image_urls: vec!["https://cdn.test/old.jpg".to_string()],
            video_ids: Vec::new(),
            video_urls: Vec::new(),
            preview_fragments: Vec::new(),
            raw_payload: None,
            last_fetched_at: Utc::now() - Duration::days(days),
            deleted_at: None,
        }
    }

    fn service(store: MemoryStore, server: &MockServer) -> CreativeService<MemoryStore> {
        let graph = GraphClient::with_base_url(30, 0, 0, &server.uri())
            .expect("client should build");
        CreativeService::new(store, graph, ServiceOptions::default())
    }

    fn mock_creative_image(creative_id: &str, url: &str) -> (String, serde_json::Value) {
        (
            format!("/{creative_id}"),
            serde_json::json!({
                "id": creative_id,
                "account_id": "42",
                "name": "fresh creative",
                "image_url": url
            }),
        )
    }

    #[tokio::test]
    async fn get_fresh_record_makes_no_network_calls() {
        let server = MockServer::start().await;
        let store = MemoryStore::seeded(vec![record_fetched_days_ago("c1", 3)]);
        let service = service(store, &server);

        let record = service.get("c1", "42", "tok", false).await.unwrap().unwrap();
        assert_eq!(record.image_urls, vec!["https://cdn.test/old.jpg"]);

        let requests = server.received_requests().await.unwrap();
        assert!(requests.is_empty(), "fresh cache hit must not hit the network");
    }

    #[tokio::test]
    async fn get_stale_record_refetches_and_advances_freshness() {
        let server = MockServer::start().await;
        let stale = record_fetched_days_ago("c1", 10);
        let old_fetched_at = stale.last_fetched_at;
        let (p, body) = mock_creative_image("c1", "https://cdn.test/new.jpg");
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let service = service(MemoryStore::seeded(vec![stale]), &server);
        let record = service.get("c1", "42", "tok", false).await.unwrap().unwrap();
        assert_eq!(record.image_urls, vec!["https://cdn.test/new.jpg"]);
        assert!(record.last_fetched_at > old_fetched_at);

        // The refreshed record is now fresh: a second get is a cache hit.
        let again = service.get("c1", "42", "tok", false).await.unwrap().unwrap();
        assert_eq!(again.image_urls, vec!["https://cdn.test/new.jpg"]);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1, "second get must be served from the store");
    }

    #[tokio::test]
    async fn get_force_refresh_bypasses_fresh_cache() {
        let server = MockServer::start().await;
        let (p, body) = mock_creative_image("c1", "https://cdn.test/new.jpg");
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let service = service(
            MemoryStore::seeded(vec![record_fetched_days_ago("c1", 1)]),
            &server,
        );
        let record = service.get("c1", "42", "tok", true).await.unwrap().unwrap();
        assert_eq!(record.image_urls, vec!["https://cdn.test/new.jpg"]);
    }

    #[tokio::test]
    async fn get_falls_back_to_stale_record_on_fetch_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/c1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let service = service(
            MemoryStore::seeded(vec![record_fetched_days_ago("c1", 10)]),
            &server,
        );
        let record = service.get("c1", "42", "tok", false).await.unwrap().unwrap();
        assert_eq!(
            record.image_urls,
            vec!["https://cdn.test/old.jpg"],
            "stale stored record should be served on fetch failure"
        );
    }

    #[tokio::test]
    async fn get_returns_none_when_nothing_stored_and_fetch_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let service = service(MemoryStore::default(), &server);
        let record = service.get("missing", "42", "tok", false).await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn get_many_fetches_only_missing_and_stale_ids() {
        let server = MockServer::start().await;
        let (p, body) = mock_creative_image("c3", "https://cdn.test/c3.jpg");
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let service = service(
            MemoryStore::seeded(vec![
                record_fetched_days_ago("c1", 2),
                record_fetched_days_ago("c2", 4),
            ]),
            &server,
        );
        let ids = vec!["c1".to_string(), "c2".to_string(), "c3".to_string()];
        let result = service.get_many(&ids, "42", "tok").await.unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result["c3"].image_urls, vec!["https://cdn.test/c3.jpg"]);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1, "only the uncached id should be fetched");
    }

    #[tokio::test]
    async fn get_many_omits_failed_ids_without_aborting() {
        let server = MockServer::start().await;
        let (p, body) = mock_creative_image("ok", "https://cdn.test/ok.jpg");
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let service = service(MemoryStore::default(), &server);
        let ids = vec!["ok".to_string(), "bad".to_string()];
        let result = service.get_many(&ids, "42", "tok").await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.contains_key("ok"));
    }

    #[tokio::test]
    async fn refresh_without_stored_record_does_full_fetch() {
        let server = MockServer::start().await;
        let (p, body) = mock_creative_image("c1", "https://cdn.test/full.jpg");
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let service = service(MemoryStore::default(), &server);
        let record = service.refresh("c1", "42", "tok").await.unwrap().unwrap();
        assert_eq!(record.image_urls, vec!["https://cdn.test/full.jpg"]);
    }

    #[tokio::test]
    async fn refresh_carousel_rewrites_exactly_the_resolved_hashes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/act_42/adimages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "hash": "h1", "url": "https://cdn.test/h1-new.jpg" },
                    { "hash": "h3", "url": "https://cdn.test/h3-new.jpg" }
                ]
            })))
            .mount(&server)
            .await;

        let mut stored = record_fetched_days_ago("c1", 1);
        stored.assembly_mode = AssemblyMode::StaticCarousel;
        stored.image_hashes = vec!["h1".to_string(), "h2".to_string(), "h3".to_string()];
        stored.image_urls = vec![
            "https://cdn.test/h1-old.jpg".to_string(),
            "https://cdn.test/h2-old.jpg".to_string(),
            "https://cdn.test/h3-old.jpg".to_string(),
        ];
        stored.child_attachments = vec![ChildAttachment {
            name: Some("slot".to_string()),
            ..ChildAttachment::default()
        }];
        let old_fetched_at = stored.last_fetched_at;

        let service = service(MemoryStore::seeded(vec![stored]), &server);
        let record = service.refresh("c1", "42", "tok").await.unwrap().unwrap();

        assert_eq!(record.image_hashes, vec!["h1", "h3"]);
        assert_eq!(
            record.image_urls,
            vec!["https://cdn.test/h1-new.jpg", "https://cdn.test/h3-new.jpg"]
        );
        assert_eq!(record.thumbnail_url.as_deref(), Some("https://cdn.test/h1-new.jpg"));
        // Non-media fields survive untouched, including the freshness signal.
        assert_eq!(record.primary_text.as_deref(), Some("stored text"));
        assert_eq!(record.child_attachments.len(), 1);
        assert_eq!(record.last_fetched_at, old_fetched_at);

        // And the store saw the same update.
        let stored_again = service.get("c1", "42", "tok", false).await.unwrap().unwrap();
        assert_eq!(stored_again.image_hashes, vec!["h1", "h3"]);
    }

    #[tokio::test]
    async fn refresh_video_record_re_resolves_single_video() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/777"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "source": "https://video.test/new.mp4"
            })))
            .mount(&server)
            .await;

        let mut stored = record_fetched_days_ago("c1", 1);
        stored.media_type = MediaType::Video;
        stored.video_ids = vec!["777".to_string()];
        stored.video_urls = vec!["https://video.test/expired.mp4".to_string()];

        let service = service(MemoryStore::seeded(vec![stored]), &server);
        let record = service.refresh("c1", "42", "tok").await.unwrap().unwrap();

        assert_eq!(record.video_urls, vec!["https://video.test/new.mp4"]);
        assert_eq!(record.video_ids, vec!["777"]);
        assert_eq!(
            record.image_urls,
            vec!["https://cdn.test/old.jpg"],
            "image media must be left untouched by a video refresh"
        );
    }

    #[tokio::test]
    async fn refresh_video_permission_failure_stores_preview_fragment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/777"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "(#10) denied", "code": 10 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c1/previews"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "body": "<iframe/>" }]
            })))
            .mount(&server)
            .await;

        let mut stored = record_fetched_days_ago("c1", 1);
        stored.media_type = MediaType::Video;
        stored.video_ids = vec!["777".to_string()];

        let service = service(MemoryStore::seeded(vec![stored]), &server);
        let record = service.refresh("c1", "42", "tok").await.unwrap().unwrap();

        assert!(record.video_urls.is_empty());
        assert_eq!(record.preview_fragments, vec!["<iframe/>"]);
    }

    #[tokio::test]
    async fn refresh_with_no_stored_media_degrades_to_full_fetch() {
        let server = MockServer::start().await;
        let (p, body) = mock_creative_image("c1", "https://cdn.test/refetched.jpg");
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        // Static image record with no hashes and no video ids.
        let mut stored = record_fetched_days_ago("c1", 1);
        stored.image_hashes = Vec::new();

        let service = service(MemoryStore::seeded(vec![stored]), &server);
        let record = service.refresh("c1", "42", "tok").await.unwrap().unwrap();

        assert_eq!(record.image_urls, vec!["https://cdn.test/refetched.jpg"]);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(
            requests[0].url.path().ends_with("/c1"),
            "must re-fetch the creative, not call the resolver with an empty batch"
        );
    }

    #[tokio::test]
    async fn date_range_sync_counts_failures_independently() {
        let server = MockServer::start().await;
        let (p, body) = mock_creative_image("ok", "https://cdn.test/ok.jpg");
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = MemoryStore {
            records: Mutex::new(HashMap::new()),
            insight_ids: vec!["ok".to_string(), "bad".to_string()],
        };
        let service = service(store, &server);

        let start = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let outcome = service
            .fetch_and_save_for_date_range(7, "42", "tok", start, end)
            .await
            .unwrap();

        assert_eq!(outcome.saved, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.creative_ids, vec!["ok", "bad"]);
    }
}

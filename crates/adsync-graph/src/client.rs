//! HTTP client for the ad platform's Graph REST API.
//!
//! Wraps `reqwest` with Graph-specific error handling and typed response
//! deserialization. Non-2xx responses carrying a Graph error envelope
//! (`{"error": {...}}`) surface as [`GraphError::Api`] with the platform's
//! error code preserved, so callers can distinguish permission denials from
//! throttling. Transient failures are retried with exponential back-off.
//!
//! Access tokens are per-user and passed per call rather than bound at
//! construction: one client instance serves every tenant.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::GraphError;
use crate::retry::retry_with_backoff;
use crate::types::{
    AdImage, AdImageList, ApiErrorEnvelope, Preview, PreviewList, RawCreative, VideoDetail,
};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v23.0";

/// Fields requested for a creative object. Everything the classifier and
/// enrichment pipeline read must be listed here — the Graph API omits any
/// field not explicitly requested.
pub const CREATIVE_FIELDS: &str = "id,account_id,name,title,body,image_hash,image_url,\
     thumbnail_url,product_set_id,call_to_action_type,object_story_spec,asset_feed_spec";

/// Fields requested for a video object.
const VIDEO_FIELDS: &str = "source,picture,length,thumbnails{uri,width,height,scale}";

/// Fields requested per image in a batched hash lookup.
const IMAGE_FIELDS: &str = "hash,url,url_128,permalink_url,width,height";

/// Client for the ad platform's Graph REST API.
///
/// Manages the HTTP client, base URL, and retry policy. Use
/// [`GraphClient::new`] for production or [`GraphClient::with_base_url`] to
/// point at a mock server in tests.
pub struct GraphClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl GraphClient {
    /// Creates a new client pointed at the production Graph API.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, GraphError> {
        Self::with_base_url(timeout_secs, max_retries, backoff_base_ms, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GraphError::InvalidUrl`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        base_url: &str,
    ) -> Result<Self, GraphError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("adsync/0.1 (creative-sync)")
            .build()?;

        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| GraphError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: trimmed.to_owned(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Generic object fetch: `GET /{id}?fields=...`.
    ///
    /// Returns the raw JSON body. Typed wrappers below build on this.
    ///
    /// # Errors
    ///
    /// - [`GraphError::Api`] if the platform returns an error envelope.
    /// - [`GraphError::Http`] on network failure.
    /// - [`GraphError::Deserialize`] if the body is not valid JSON.
    pub async fn get_object(
        &self,
        token: &str,
        id: &str,
        fields: &str,
    ) -> Result<serde_json::Value, GraphError> {
        let url = self.build_url(id, &[("fields", fields)], token)?;
        self.request_json(&url).await
    }

    /// Fetches a creative with every field the pipeline reads, returning both
    /// the typed view and the verbatim payload (retained for audit/replay).
    ///
    /// # Errors
    ///
    /// As [`GraphClient::get_object`], plus [`GraphError::Deserialize`] if
    /// the payload does not match [`RawCreative`].
    pub async fn get_creative(
        &self,
        token: &str,
        creative_id: &str,
    ) -> Result<(RawCreative, serde_json::Value), GraphError> {
        let body = self.get_object(token, creative_id, CREATIVE_FIELDS).await?;
        let creative: RawCreative =
            serde_json::from_value(body.clone()).map_err(|e| GraphError::Deserialize {
                context: format!("creative {creative_id}"),
                source: e,
            })?;
        Ok((creative, body))
    }

    /// Resolves up to a page of image hashes in one round trip:
    /// `GET /act_{account_id}/adimages?hashes=[...]`.
    ///
    /// The result may be smaller than the input — hashes the account no
    /// longer knows are simply absent.
    ///
    /// # Errors
    ///
    /// As [`GraphClient::get_object`].
    pub async fn get_image_batch(
        &self,
        token: &str,
        account_id: &str,
        hashes: &[String],
    ) -> Result<Vec<AdImage>, GraphError> {
        let hashes_param =
            serde_json::to_string(hashes).map_err(|e| GraphError::Deserialize {
                context: format!("hashes param for account {account_id}"),
                source: e,
            })?;
        let path = format!("act_{account_id}/adimages");
        let url = self.build_url(
            &path,
            &[("hashes", &hashes_param), ("fields", IMAGE_FIELDS)],
            token,
        )?;
        let body = self.request_json(&url).await?;
        let list: AdImageList =
            serde_json::from_value(body).map_err(|e| GraphError::Deserialize {
                context: format!("adimages for account {account_id}"),
                source: e,
            })?;
        Ok(list.data)
    }

    /// Fetches playback details for a video: source URL, default picture,
    /// duration, and every thumbnail variant.
    ///
    /// # Errors
    ///
    /// As [`GraphClient::get_object`]. Permission denials surface as
    /// [`GraphError::Api`] with [`GraphError::is_permission_denied`] true.
    pub async fn get_video(&self, token: &str, video_id: &str) -> Result<VideoDetail, GraphError> {
        let url = self.build_url(video_id, &[("fields", VIDEO_FIELDS)], token)?;
        let body = self.request_json(&url).await?;
        serde_json::from_value(body).map_err(|e| GraphError::Deserialize {
            context: format!("video {video_id}"),
            source: e,
        })
    }

    /// Fetches rendered preview fragments for a creative:
    /// `GET /{creative_id}/previews?ad_format=...`.
    ///
    /// # Errors
    ///
    /// As [`GraphClient::get_object`].
    pub async fn get_previews(
        &self,
        token: &str,
        creative_id: &str,
        ad_format: &str,
    ) -> Result<Vec<Preview>, GraphError> {
        let path = format!("{creative_id}/previews");
        let url = self.build_url(&path, &[("ad_format", ad_format)], token)?;
        let body = self.request_json(&url).await?;
        let list: PreviewList =
            serde_json::from_value(body).map_err(|e| GraphError::Deserialize {
                context: format!("previews for creative {creative_id}"),
                source: e,
            })?;
        Ok(list.data)
    }

    /// Builds the full request URL with properly percent-encoded query
    /// parameters. The access token is always appended last.
    fn build_url(
        &self,
        path: &str,
        extra: &[(&str, &str)],
        token: &str,
    ) -> Result<Url, GraphError> {
        let raw = format!("{}/{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| GraphError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("access_token", token);
        }
        Ok(url)
    }

    /// Sends a GET request with retry, maps Graph error envelopes to
    /// [`GraphError::Api`], and parses the response body as JSON.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, GraphError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                let body = response.text().await?;

                if !status.is_success() {
                    // Graph reports application errors as 4xx with a JSON
                    // envelope; anything else is an infrastructure failure.
                    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(&body) {
                        return Err(GraphError::Api {
                            code: envelope.error.code,
                            subcode: envelope.error.error_subcode,
                            message: envelope.error.message,
                        });
                    }
                    return Err(GraphError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: redact_token(&url),
                    });
                }

                serde_json::from_str(&body).map_err(|e| GraphError::Deserialize {
                    context: redact_token(&url),
                    source: e,
                })
            }
        })
        .await
    }
}

/// Renders a request URL with the access token stripped, for error messages
/// and logs.
fn redact_token(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    redacted.query_pairs_mut().clear();
    {
        let mut serializer = redacted.query_pairs_mut();
        for (k, v) in &pairs {
            serializer.append_pair(k, v);
        }
    }
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GraphClient {
        GraphClient::with_base_url(30, 0, 0, base_url)
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_appends_token_last() {
        let client = test_client("https://graph.facebook.com/v23.0");
        let url = client
            .build_url("12345", &[("fields", "id,name")], "tok")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.facebook.com/v23.0/12345?fields=id%2Cname&access_token=tok"
        );
    }

    #[test]
    fn build_url_strips_trailing_slash() {
        let client = test_client("https://graph.facebook.com/v23.0/");
        let url = client.build_url("12345", &[], "tok").unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.facebook.com/v23.0/12345?access_token=tok"
        );
    }

    #[test]
    fn redact_token_strips_access_token() {
        let url = Url::parse("https://graph.test/v23.0/1?fields=id&access_token=secret").unwrap();
        let redacted = redact_token(&url);
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("fields=id"));
    }

    #[tokio::test]
    async fn get_video_parses_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/777"))
            .and(query_param("access_token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "source": "https://video.test/source.mp4",
                "picture": "https://video.test/pic.jpg",
                "length": 12.5,
                "thumbnails": { "data": [
                    { "uri": "https://video.test/t1.jpg", "width": 100, "height": 100 }
                ]}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let detail = client.get_video("tok", "777").await.unwrap();
        assert_eq!(detail.source.as_deref(), Some("https://video.test/source.mp4"));
        assert_eq!(detail.thumbnails.unwrap().data.len(), 1);
    }

    #[tokio::test]
    async fn error_envelope_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/999"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {
                    "message": "(#10) Permission denied",
                    "type": "OAuthException",
                    "code": 10
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.get_object("tok", "999", "id").await.unwrap_err();
        assert!(
            matches!(err, GraphError::Api { code: 10, .. }),
            "expected Api(code=10), got: {err:?}"
        );
        assert!(err.is_permission_denied());
    }

    #[tokio::test]
    async fn get_image_batch_parses_data_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/act_42/adimages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "hash": "aaa", "url": "https://cdn.test/a.jpg", "width": 10, "height": 10 },
                    { "hash": "bbb", "permalink_url": "https://cdn.test/b-perm.jpg" }
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let images = client
            .get_image_batch("tok", "42", &["aaa".to_string(), "bbb".to_string()])
            .await
            .unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].best_url(), Some("https://cdn.test/b-perm.jpg"));
    }

    #[tokio::test]
    async fn unexpected_status_without_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.get_object("tok", "1", "id").await.unwrap_err();
        assert!(
            matches!(err, GraphError::UnexpectedStatus { status: 403, .. }),
            "expected UnexpectedStatus(403), got: {err:?}"
        );
    }
}

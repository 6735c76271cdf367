use thiserror::Error;

/// Graph API error codes that indicate the caller lacks permission to read
/// the object: code 10 plus the 200-299 permission range.
const PERMISSION_CODE: i64 = 10;
const PERMISSION_RANGE: std::ops::RangeInclusive<i64> = 200..=299;

/// Graph API error codes that indicate request throttling: 4 (application),
/// 17 (user), 32 (page), 613 (custom rate limit).
const RATE_LIMIT_CODES: [i64; 4] = [4, 17, 32, 613];

/// Errors returned by the ad-platform Graph API client.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Graph API returned an error envelope (`{"error": {...}}`).
    #[error("Graph API error {code}: {message}")]
    Api {
        code: i64,
        subcode: Option<i64>,
        message: String,
    },

    /// Non-2xx HTTP status without a parseable Graph error envelope.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request URL could not be constructed from the configured base URL.
    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl GraphError {
    /// `true` when the error is a permission-class Graph API error — the
    /// caller's token cannot read the object. Drives the preview-fragment
    /// fallback for video resolution.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            GraphError::Api { code, .. } => {
                *code == PERMISSION_CODE || PERMISSION_RANGE.contains(code)
            }
            _ => false,
        }
    }

    /// `true` when the error is a Graph API throttling error.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GraphError::Api { code, .. } => RATE_LIMIT_CODES.contains(code),
            _ => false,
        }
    }
}

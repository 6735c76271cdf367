#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub graph_access_token: Option<String>,
    pub graph_base_url: String,
    pub graph_request_timeout_secs: u64,
    pub graph_max_retries: u32,
    pub graph_retry_backoff_base_ms: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch_concurrency: usize,
    pub cache_ttl_days: i64,
    pub resolve_feed_videos: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "graph_access_token",
                &self.graph_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("graph_base_url", &self.graph_base_url)
            .field(
                "graph_request_timeout_secs",
                &self.graph_request_timeout_secs,
            )
            .field("graph_max_retries", &self.graph_max_retries)
            .field(
                "graph_retry_backoff_base_ms",
                &self.graph_retry_backoff_base_ms,
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("cache_ttl_days", &self.cache_ttl_days)
            .field("resolve_feed_videos", &self.resolve_feed_videos)
            .finish()
    }
}

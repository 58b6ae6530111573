use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
// Core data model lives in the interfaces crate
pub use interfaces::defs::{
    CategoryFilter, IdentityKey, NewsItem, SourceDescriptor, SourceKind, ALL_CATEGORIES, MISSING_LINK,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    pub max_entries_per_source: usize,
    pub recency_window_hours: i64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            // Several publishers answer 403 to library user agents
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            timeout_seconds: 10,
            max_feed_size_mb: 10,
            max_redirects: 5,
            max_entries_per_source: 20,
            recency_window_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub max_concurrent_fetches: usize,
    pub cache_ttl_seconds: u64,
    pub dedup_prefix_chars: usize,
    pub fetch_deadline_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            cache_ttl_seconds: 300,
            dedup_prefix_chars: 100,
            fetch_deadline_ms: 15_000,
        }
    }
}

/// One entry as read from an upstream document, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub title: String,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Statistics for the last completed aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub epoch: u64,
    pub sources_attempted: usize,
    pub sources_failed: Vec<String>,
    pub raw_items: usize,
    pub duplicates_dropped: usize,
    pub merged_items: usize,
    pub completed_at: DateTime<Utc>,
}

impl AggregateReport {
    pub fn sources_succeeded(&self) -> usize {
        self.sources_attempted - self.sources_failed.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid source registry: {0}")]
    InvalidRegistry(String),

    #[error("Unknown source labels: {0}")]
    UnknownSources(String),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Source {label} timed out after {millis}ms")]
    Timeout { label: String, millis: u64 },

    #[error("Fetch task for {label} failed: {reason}")]
    Task { label: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;

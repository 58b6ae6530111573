use crate::types::{NewsItem, Result, SourceDescriptor};
use async_trait::async_trait;

/// Turns one source descriptor into normalized news items.
///
/// Implementations report failures through the error channel; the
/// aggregator decides what a failed source means for the merged result.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<NewsItem>>;
}

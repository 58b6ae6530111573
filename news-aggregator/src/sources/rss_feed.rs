use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::types::{AggregatorError, RawEntry, Result, SourceDescriptor};
use tracing::debug;

/// Fetch and parse a syndication feed.
pub async fn fetch_entries(fetcher: &Fetcher, source: &SourceDescriptor) -> Result<Vec<RawEntry>> {
    let content = fetcher.fetch_document(&source.endpoint).await?;

    if !FeedParser::is_valid_feed_content(&content) {
        return Err(AggregatorError::Parse(format!(
            "{} did not return an RSS/Atom document",
            source.endpoint
        )));
    }

    let entries = FeedParser::parse_feed(&content)?;
    debug!("Feed {} yielded {} entries", source.short_label, entries.len());
    Ok(entries)
}

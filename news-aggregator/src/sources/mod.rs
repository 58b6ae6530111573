pub mod html_table;
pub mod rss_feed;

use crate::fetcher::Fetcher;
use crate::traits::SourceFetcher;
use crate::types::{FetchConfig, NewsItem, RawEntry, Result, SourceDescriptor, SourceKind, MISSING_LINK};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Production fetcher: HTTP transport plus the parser matching the source kind.
pub struct HttpSourceFetcher {
    fetcher: Fetcher,
}

impl HttpSourceFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<Vec<NewsItem>> {
        let now = Utc::now();
        let entries = match &source.kind {
            SourceKind::Feed => rss_feed::fetch_entries(&self.fetcher, source).await?,
            SourceKind::HtmlTable { row_selector } => {
                html_table::fetch_entries(&self.fetcher, source, row_selector, now).await?
            }
        };

        let raw_count = entries.len();
        let items = normalize_entries(source, entries, now, self.fetcher.config());
        debug!(
            "Source {}: {} raw entries, {} kept",
            source.short_label,
            raw_count,
            items.len()
        );
        Ok(items)
    }
}

/// Turn raw entries into news items for `source`.
///
/// Drops undated entries, entries older than the recency window and
/// entries with a blank title, then keeps at most
/// `max_entries_per_source` in document order. Timestamps after `now`
/// are clamped to `now`.
pub fn normalize_entries(
    source: &SourceDescriptor,
    entries: Vec<RawEntry>,
    now: DateTime<Utc>,
    config: &FetchConfig,
) -> Vec<NewsItem> {
    let cutoff = now - Duration::hours(config.recency_window_hours);

    entries
        .into_iter()
        .filter_map(|entry| {
            let published_at = entry.published_at?.min(now);
            if published_at < cutoff {
                return None;
            }
            let title = entry.title.trim();
            if title.is_empty() {
                return None;
            }
            Some(NewsItem {
                published_at,
                source_label: source.short_label.clone(),
                title: title.to_string(),
                link: entry.link.unwrap_or_else(|| MISSING_LINK.to_string()),
                categories: source.categories.clone(),
            })
        })
        .take(config.max_entries_per_source)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
    }

    fn entry(title: &str, link: Option<&str>, hours_ago: Option<i64>) -> RawEntry {
        RawEntry {
            title: title.to_string(),
            link: link.map(str::to_string),
            published_at: hours_ago.map(|h| now() - Duration::hours(h)),
        }
    }

    fn source() -> SourceDescriptor {
        SourceDescriptor::feed("ANSA", "https://www.ansa.it/rss.xml", "ANSA", &["Italia", "Generale"])
    }

    #[test]
    fn drops_old_and_undated_entries() {
        let entries = vec![
            entry("fresh", Some("https://a/1"), Some(1)),
            entry("stale", Some("https://a/2"), Some(25)),
            entry("undated", Some("https://a/3"), None),
            entry("edge", Some("https://a/4"), Some(24)),
        ];
        let items = normalize_entries(&source(), entries, now(), &FetchConfig::default());

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh", "edge"]);

        let cutoff = now() - Duration::days(1);
        assert!(items.iter().all(|i| i.published_at >= cutoff));
    }

    #[test]
    fn trims_titles_tags_and_defaults_link() {
        let entries = vec![
            entry("  Spazi attorno  ", None, Some(2)),
            entry("   ", Some("https://a/blank"), Some(2)),
        ];
        let items = normalize_entries(&source(), entries, now(), &FetchConfig::default());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Spazi attorno");
        assert_eq!(items[0].link, MISSING_LINK);
        assert_eq!(items[0].source_label, "ANSA");
        assert!(items[0].categories.contains("Generale"));
    }

    #[test]
    fn future_timestamps_are_clamped_to_now() {
        let entries = vec![
            entry("scheduled", Some("https://a/future"), Some(-23)),
            entry("ok", Some("https://a/ok"), Some(1)),
        ];
        let items = normalize_entries(&source(), entries, now(), &FetchConfig::default());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].published_at, now());
        assert!(items.iter().all(|i| i.published_at <= now()));
    }

    #[test]
    fn scraped_late_evening_row_stays_in_window() {
        let just_after_midnight = Utc.with_ymd_and_hms(2024, 1, 2, 0, 10, 0).unwrap();
        let entries = vec![RawEntry {
            title: "Chiusura di Wall Street".to_string(),
            link: Some("https://a/wallstreet".to_string()),
            published_at: crate::dates::parse_lenient("23:50", just_after_midnight),
        }];
        let items = normalize_entries(&source(), entries, just_after_midnight, &FetchConfig::default());

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].published_at, Utc.with_ymd_and_hms(2024, 1, 1, 23, 50, 0).unwrap());
    }

    #[test]
    fn caps_entries_in_document_order() {
        let config = FetchConfig {
            max_entries_per_source: 3,
            ..FetchConfig::default()
        };
        let entries = (0..10)
            .map(|i| entry(&format!("item {}", i), Some("https://a/x"), Some(i)))
            .collect();
        let items = normalize_entries(&source(), entries, now(), &config);

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["item 0", "item 1", "item 2"]);
    }
}

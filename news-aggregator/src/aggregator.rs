use crate::cache::AggregateCache;
use crate::registry::SourceRegistry;
use crate::traits::SourceFetcher;
use crate::types::{AggregateReport, AggregatorConfig, AggregatorError, IdentityKey, NewsItem, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Fetches every registered source, merges the results and memoizes the
/// merged set for `cache_ttl_seconds`.
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn SourceFetcher>,
    config: AggregatorConfig,
    cache: RwLock<AggregateCache>,
    // Held for the whole fetch-merge cycle so one expiry triggers one run
    refresh_lock: Mutex<()>,
}

impl Aggregator {
    pub fn new(registry: Arc<SourceRegistry>, fetcher: Arc<dyn SourceFetcher>, config: AggregatorConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_seconds);
        Self {
            registry,
            fetcher,
            config,
            cache: RwLock::new(AggregateCache::new(ttl)),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Merged, deduplicated items, newest first.
    ///
    /// Served from cache inside the TTL; otherwise blocks on a full
    /// re-fetch of every source.
    pub async fn aggregate(&self) -> Arc<Vec<NewsItem>> {
        if let Some(items) = self.cache.read().await.fresh(Instant::now()) {
            debug!("Serving {} items from cache", items.len());
            return items;
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(items) = self.cache.read().await.fresh(Instant::now()) {
            return items;
        }

        let (items, report) = self.run_once().await;
        let items = Arc::new(items);
        let epoch = self
            .cache
            .write()
            .await
            .store(Arc::clone(&items), report, Instant::now());
        info!("Aggregate epoch {} holds {} items", epoch, items.len());
        items
    }

    /// Drop the cached set; the next `aggregate` re-fetches.
    pub async fn invalidate(&self) {
        self.cache.write().await.invalidate();
        debug!("Aggregate cache invalidated");
    }

    pub async fn refresh(&self) -> Arc<Vec<NewsItem>> {
        self.invalidate().await;
        self.aggregate().await
    }

    pub async fn last_report(&self) -> Option<AggregateReport> {
        self.cache.read().await.report().cloned()
    }

    pub async fn epoch(&self) -> u64 {
        self.cache.read().await.epoch()
    }

    async fn run_once(&self) -> (Vec<NewsItem>, AggregateReport) {
        let sources = self.registry.sources();
        let deadline = Duration::from_millis(self.config.fetch_deadline_ms);
        info!("Fetching {} sources", sources.len());

        let outcomes: Vec<(String, Result<Vec<NewsItem>>)> = stream::iter(sources.iter().cloned())
            .map(|source| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let label = source.short_label.clone();
                    let task = tokio::spawn(async move { tokio::time::timeout(deadline, fetcher.fetch(&source)).await });
                    let outcome = match task.await {
                        Ok(Ok(result)) => result,
                        Ok(Err(_)) => Err(AggregatorError::Timeout {
                            label: label.clone(),
                            millis: deadline.as_millis() as u64,
                        }),
                        Err(e) => Err(AggregatorError::Task {
                            label: label.clone(),
                            reason: e.to_string(),
                        }),
                    };
                    (label, outcome)
                }
            })
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut batches = Vec::with_capacity(outcomes.len());
        let mut sources_failed = Vec::new();
        for (label, outcome) in outcomes {
            match outcome {
                Ok(items) => {
                    debug!("Source {} contributed {} items", label, items.len());
                    batches.push(items);
                }
                Err(e) => {
                    warn!(source = %label, error = %e, "source fetch failed; continuing without it");
                    sources_failed.push(label);
                }
            }
        }
        sources_failed.sort();

        let raw_items: usize = batches.iter().map(Vec::len).sum();
        let merged = merge_items(batches, self.config.dedup_prefix_chars);

        info!(
            "Merged {} items from {}/{} sources ({} duplicates dropped)",
            merged.len(),
            sources.len() - sources_failed.len(),
            sources.len(),
            raw_items - merged.len()
        );

        let report = AggregateReport {
            epoch: 0,
            sources_attempted: sources.len(),
            sources_failed,
            raw_items,
            duplicates_dropped: raw_items - merged.len(),
            merged_items: merged.len(),
            completed_at: Utc::now(),
        };
        (merged, report)
    }
}

/// Concatenate, sort newest first, keep the first item per identity key.
///
/// The sort is stable and runs before dedup, so the survivor of each
/// duplicate group is its most recent member.
pub fn merge_items(batches: Vec<Vec<NewsItem>>, prefix_chars: usize) -> Vec<NewsItem> {
    let mut items: Vec<NewsItem> = batches.into_iter().flatten().collect();
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut seen_keys: HashSet<IdentityKey> = HashSet::with_capacity(items.len());
    items.retain(|item| seen_keys.insert(item.identity_key(prefix_chars)));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn item(label: &str, title: &str, link: &str, hour: u32) -> NewsItem {
        NewsItem {
            published_at: at(hour),
            source_label: label.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            categories: Default::default(),
        }
    }

    #[test]
    fn merge_sorts_descending() {
        let merged = merge_items(
            vec![
                vec![item("A", "X", "a", 10), item("A", "Y", "b", 9)],
                vec![item("B", "Z", "c", 11)],
                vec![],
            ],
            100,
        );
        let links: Vec<_> = merged.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["c", "a", "b"]);
        assert!(merged.windows(2).all(|w| w[0].published_at >= w[1].published_at));
    }

    #[test]
    fn merge_keeps_most_recent_duplicate() {
        let merged = merge_items(
            vec![
                vec![item("A", "Same", "https://x/same", 9)],
                vec![item("B", "Same", "https://x/same", 10)],
            ],
            100,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].published_at, at(10));
        assert_eq!(merged[0].source_label, "B");
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge_items(
            vec![
                vec![item("A", "One", "1", 8), item("A", "Two", "2", 7)],
                vec![item("B", "One", "1", 6), item("B", "Three", "3", 9)],
            ],
            100,
        );
        let twice = merge_items(vec![once.clone()], 100);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn prefix_controls_duplicate_detection() {
        let batches = || {
            vec![vec![
                item("A", "Breaking: markets rally (update 1)", "https://example.com/markets-rally?v=1", 10),
                item("B", "Breaking: markets rally (update 2)", "https://example.com/markets-rally?v=2", 9),
            ]]
        };
        assert_eq!(merge_items(batches(), 100).len(), 2);
        assert_eq!(merge_items(batches(), 20).len(), 1);
    }
}
